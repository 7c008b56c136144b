//! 后台定时任务
//!
//! 启动时调用一次 `spawn_all`。

use crate::services::VerificationCodeService;

/// 启动全部后台任务（通过 `tokio::spawn` 分离运行，不阻塞）
pub fn spawn_all(codes: VerificationCodeService, purge_interval_secs: u64) {
    // 定期清理过期的核销验证码；过期码在校验时已视为不存在，这里只回收内存
    tokio::spawn(async move {
        let interval = std::time::Duration::from_secs(purge_interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            let purged = codes.purge_expired().await;
            if purged > 0 {
                log::info!("Expired verification codes purged: {purged}");
            }
        }
    });
}
