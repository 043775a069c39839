//! 时间来源。签名url时的过期时间在签名那一刻计算，测试中可以注入固定时间。

use std::sync::Mutex;
use time::OffsetDateTime;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// 返回设置好的时间，可以通过`advance`/`set`手动推进
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// 以unix秒构造，超出范围时使用UNIX_EPOCH
    pub fn from_unix_timestamp(secs: i64) -> Self {
        Self::new(OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH))
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.lock() = now;
    }

    pub fn advance(&self, d: time::Duration) {
        let mut now = self.lock();
        *now += d;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OffsetDateTime> {
        // 锁内没有会panic的代码，poison后直接取回数据
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.lock()
    }
}

#[test]
fn fixed_clock_test() {
    let clock = FixedClock::from_unix_timestamp(1_700_000_000);
    assert_eq!(clock.now().unix_timestamp(), 1_700_000_000);
    clock.advance(time::Duration::seconds(30));
    assert_eq!(clock.now().unix_timestamp(), 1_700_000_030);
}
