use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

use crate::error::{DiagnosisError, Result};

/// 打开一个页面并导航到 `url`
///
/// `debug_port` 为 0 时启动无头浏览器，否则连接到本地已开启调试端口的浏览器
pub async fn open_page(debug_port: u16, url: &str) -> Result<(Browser, Page)> {
    let (browser, mut handler) = if debug_port == 0 {
        info!("🚀 启动无头浏览器...");
        let config = BrowserConfig::builder()
            .new_headless_mode()
            .args(vec![
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
            ])
            .build()
            .map_err(|e| {
                error!("配置无头浏览器失败: {}", e);
                DiagnosisError::Browser(format!("配置无头浏览器失败: {}", e))
            })?;
        Browser::launch(config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            e
        })?
    } else {
        let browser_url = format!("http://localhost:{}", debug_port);
        info!("正在连接到浏览器: {}", browser_url);
        Browser::connect(&browser_url).await.map_err(|e| {
            error!("连接浏览器失败: {}", e);
            e
        })?
    };
    debug!("浏览器就绪");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let page = browser.new_page(url).await.map_err(|e| {
        error!("打开页面失败 {}: {}", url, e);
        e
    })?;
    debug!("页面已打开: {}", url);

    Ok((browser, page))
}
