mod common;

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, SystemTime};

use mensacard::nfc::Platform;
use mensacard::{read_card_information, CardReading, Config};

use common::*;

fn read(provider: &MockProvider) -> Option<CardReading> {
    read_card_information((), provider, &Config::default())
}

#[test]
fn test_reads_balance_and_last_transaction() {
    // Both fields are stored little-endian: 0x00001388 = 5000 and 0x0064 = 100.
    let provider = MockProvider::new(vec![ok(&[]), balance_response(), transaction_response()]);
    let before = SystemTime::now();

    let reading = read(&provider).unwrap();

    assert_eq!("5", reading.current_balance);
    assert_eq!("0.1", reading.last_transaction);
    assert!(!reading.error);
    assert!(reading.read_time >= before);
    assert!(reading.read_time <= SystemTime::now() + Duration::from_secs(1));
    assert_eq!(vec![Some(LINK)], *provider.released.borrow());
}

#[test]
fn test_partial_reading_is_returned() {
    let provider = MockProvider::new(vec![ok(&[]), balance_response(), rejected()]);

    let reading = read(&provider).unwrap();

    assert_eq!("5", reading.current_balance);
    assert_eq!("error", reading.last_transaction);
    assert!(reading.error);
    assert_eq!(1, provider.release_count());
}

#[test]
fn test_releases_once_when_acquisition_fails() {
    let provider = MockProvider::new(vec![]).acquire(Acquire::Fail);

    assert_eq!(None, read(&provider));
    assert_eq!(vec![None], *provider.released.borrow());
}

#[test]
fn test_releases_once_when_no_link() {
    let provider = MockProvider::new(vec![]).acquire(Acquire::NoLink);

    assert_eq!(None, read(&provider));
    assert_eq!(vec![None], *provider.released.borrow());
}

#[test]
fn test_releases_once_when_tag_fails() {
    let provider = MockProvider::new(vec![]).failing_tag();

    assert_eq!(None, read(&provider));
    assert_eq!(vec![Some(LINK)], *provider.released.borrow());
}

#[test]
fn test_releases_once_on_each_failed_step() {
    let scripts = vec![
        vec![rejected()],
        vec![None],
        vec![ok(&[]), rejected()],
        vec![ok(&[]), None],
    ];

    for script in scripts {
        let provider = MockProvider::new(script);

        assert_eq!(None, read(&provider));
        assert_eq!(vec![Some(LINK)], *provider.released.borrow());
    }
}

#[test]
fn test_releases_once_when_provider_panics() {
    let provider = MockProvider::new(vec![]).panicking_exchange();

    let result = panic::catch_unwind(AssertUnwindSafe(|| read(&provider)));

    assert!(result.is_err());
    assert!(provider.sent_commands().is_empty());
    assert_eq!(vec![Some(LINK)], *provider.released.borrow());
}

#[test]
fn test_release_failure_keeps_reading() {
    let provider = MockProvider::new(vec![ok(&[]), balance_response(), transaction_response()])
        .failing_release();

    let reading = read(&provider).unwrap();

    assert_eq!("5", reading.current_balance);
    assert_eq!("0.1", reading.last_transaction);
    assert_eq!(1, provider.release_count());
}

#[test]
fn test_release_failure_after_failed_session() {
    let provider = MockProvider::new(vec![]).acquire(Acquire::Fail).failing_release();

    assert_eq!(None, read(&provider));
    assert_eq!(1, provider.release_count());
}

#[test]
fn test_sessions_do_not_share_state() {
    let config = Config::new(Platform::Ios);

    let first = MockProvider::new(vec![ok(&[]), balance_response(), transaction_response()]);
    let second = MockProvider::new(vec![ok(&[]), ok(&[0xE8, 0x03, 0x00, 0x00]), rejected()]);

    let a = read_card_information((), &first, &config).unwrap();
    let b = read_card_information((), &second, &config).unwrap();

    assert_eq!("5", a.current_balance);
    assert!(!a.error);
    assert_eq!("1", b.current_balance);
    assert!(b.error);
}
