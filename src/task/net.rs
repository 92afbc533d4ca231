//! IP stack runner

/// Runs the `embassy-net` stack on top of the CYW43439 network driver
#[embassy_executor::task]
pub async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}
