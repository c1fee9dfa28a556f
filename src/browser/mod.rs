pub mod connection;
pub mod headless;

use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

/// 一个已就绪的浏览器及其工作页面
pub struct BrowserSession {
    pub browser: Browser,
    pub page: Page,
    /// 后台事件处理任务
    pub handler: JoinHandle<()>,
    /// 是否连接到已有浏览器（此时释放时只关闭页面）
    pub attached: bool,
}
