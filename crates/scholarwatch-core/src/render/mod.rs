mod html;
mod rss;

pub use html::{render_options_page, render_status_page, OptionsView, StatusView};
pub use rss::{render_rss, Channel};
