use usereg_auth::browser::launch_headless_browser;
use usereg_auth::infrastructure::{ChromiumDriver, Locator, PageDriver, WaitOutcome};
use usereg_auth::models::AddressFamily;
use usereg_auth::services::NetworkAddressResolver;
use usereg_auth::utils::logging;
use usereg_auth::{App, Config};

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_full_run_against_portal() {
    // 初始化日志
    logging::init();

    // 加载配置（需设置 PORTAL_USERNAME / PORTAL_PASSWORD，并启动 OCR 服务）
    let config = Config::load().expect("加载配置失败");

    let outcome = App::new(config).run().await.expect("运行失败");
    assert!(outcome.is_success(), "应该完成准入代认证: {:?}", outcome);
}

#[tokio::test]
#[ignore]
async fn test_browser_launch_and_release() {
    logging::init();

    let config = Config::from_env().expect("加载配置失败");
    let session = launch_headless_browser(config.chrome_executable.as_deref())
        .await
        .expect("启动浏览器失败");
    let mut driver = ChromiumDriver::new(session);

    driver.navigate(&config.portal_url).await.expect("打开门户失败");
    let outcome = driver
        .wait_for(
            &config.locators.captcha_image,
            std::time::Duration::from_secs(10),
        )
        .await
        .expect("等待验证码失败");
    assert_eq!(outcome, WaitOutcome::Found, "登录页应该有验证码图片");

    let png = driver
        .screenshot(&Locator::Css("#loginform-verifycode-image".to_string()))
        .await
        .expect("截图失败");
    assert!(!png.is_empty());

    driver.release().await.expect("释放浏览器失败");
    // 重复释放不做任何事
    driver.release().await.expect("重复释放失败");
    assert!(driver.navigate(&config.portal_url).await.is_err());
}

#[test]
#[ignore]
fn test_system_interfaces_discover() {
    logging::init();

    let result = NetworkAddressResolver::system(AddressFamily::V6).discover();
    match result {
        Ok(addr) => {
            println!("找到地址: {}", addr);
            assert!(addr.is_global());
        }
        Err(e) => println!("本机没有公网 IPv6 地址: {}", e),
    }
}
