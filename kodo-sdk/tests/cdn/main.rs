#![cfg(feature = "cdn")]

use kodo_sdk::cdn;
use kodo_sdk::clock::FixedClock;
use kodo_sdk::credentials::Credentials;
use kodo_sdk::kodo::download_url::{PublicUrl, Scheme};
use time::Duration;

#[test]
fn timestamp_and_private_urls_are_independent() {
    let clock = FixedClock::from_unix_timestamp(1_577_836_000);
    let mut url = PublicUrl::new("cdn.d.com", "v/a.mp4", Scheme::Https);
    url.set_filename("a.mp4");

    let leech = url
        .timestamp()
        .ttl(Duration::seconds(800))
        .build()
        .sign("secret", &clock)
        .unwrap();
    let private = url
        .private()
        .ttl(Duration::seconds(800))
        .build()
        .sign(&Credentials::new("ak", "sk"), &clock)
        .unwrap();

    // 防盗链的签名在路径中，参数保持原样
    assert!(leech.starts_with("https://cdn.d.com/"));
    assert!(leech.ends_with("/5e0be100/v%2Fa.mp4?attname=a.mp4"));
    // 私有url的签名在query中
    assert!(private.starts_with("https://cdn.d.com/v%2Fa.mp4?attname=a.mp4&e=1577836800&token=ak:"));

    // 修改url后重新签名会反映新的字段
    url.set_filename("b.mp4");
    let leech2 = url
        .timestamp()
        .ttl(Duration::seconds(800))
        .build()
        .sign("secret", &clock)
        .unwrap();
    assert!(leech2.ends_with("?attname=b.mp4"));
    assert_eq!(leech[..leech.len() - 5], leech2[..leech2.len() - 5]);
}

#[test]
fn same_clock_same_url() {
    let clock = FixedClock::from_unix_timestamp(1_577_836_000);
    let url = PublicUrl::new("cdn.d.com", "k", Scheme::Http);
    let a = url.timestamp().build().sign("secret", &clock).unwrap();
    let b = url.timestamp().build().sign("secret", &clock).unwrap();
    assert_eq!(a, b);
    assert!(matches!(
        url.timestamp().build().sign("", &clock),
        Err(cdn::Error::InvalidInput(_))
    ));
}
