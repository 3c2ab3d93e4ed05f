//! A scripted link provider standing in for the NFC stack.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use mensacard::nfc::{self, Exchange, LinkProvider, RequestOptions, Technology};

pub const LINK: u32 = 42;

/// Outcome of the technology request.
pub enum Acquire {
    Link,
    NoLink,
    Fail,
}

pub struct MockProvider {
    acquire: Acquire,
    tag_fails: bool,
    release_fails: bool,
    exchange_panics: bool,
    /// `None` makes the exchange fail.
    responses: RefCell<VecDeque<Option<Vec<u8>>>>,

    pub requested: RefCell<Vec<(Technology, String)>>,
    pub tags_read: Cell<usize>,
    pub sent: RefCell<Vec<(Exchange, Vec<u8>)>>,
    pub released: RefCell<Vec<Option<u32>>>,
}

impl MockProvider {
    pub fn new(responses: Vec<Option<Vec<u8>>>) -> Self {
        Self {
            acquire: Acquire::Link,
            tag_fails: false,
            release_fails: false,
            exchange_panics: false,
            responses: RefCell::new(responses.into()),
            requested: RefCell::default(),
            tags_read: Cell::new(0),
            sent: RefCell::default(),
            released: RefCell::default(),
        }
    }

    pub fn acquire(mut self, acquire: Acquire) -> Self {
        self.acquire = acquire;
        self
    }

    pub fn failing_tag(mut self) -> Self {
        self.tag_fails = true;
        self
    }

    pub fn failing_release(mut self) -> Self {
        self.release_fails = true;
        self
    }

    /// Makes every exchange panic, like a buggy driver.
    pub fn panicking_exchange(mut self) -> Self {
        self.exchange_panics = true;
        self
    }

    pub fn sent_commands(&self) -> Vec<Vec<u8>> {
        self.sent.borrow().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn release_count(&self) -> usize {
        self.released.borrow().len()
    }

    fn exchange(&self, mechanism: Exchange, link: &u32, command: &[u8]) -> nfc::Result<Vec<u8>> {
        assert_eq!(LINK, *link);
        assert_eq!(1, self.tags_read.get(), "tag must be read before any command");
        if self.exchange_panics {
            panic!("driver bug");
        }

        self.sent.borrow_mut().push((mechanism, command.to_vec()));

        match self.responses.borrow_mut().pop_front() {
            Some(Some(response)) => Ok(response),
            _ => Err(nfc::Error::other("tag was lost")),
        }
    }
}

impl LinkProvider<()> for MockProvider {
    type Link = u32;
    type Tag = ();

    fn request_technology(
        &self,
        _: (),
        kind: Technology,
        options: &RequestOptions,
    ) -> nfc::Result<Option<u32>> {
        self.requested
            .borrow_mut()
            .push((kind, options.alert_message.clone()));

        match self.acquire {
            Acquire::Link => Ok(Some(LINK)),
            Acquire::NoLink => Ok(None),
            Acquire::Fail => Err(nfc::Error::Cancelled),
        }
    }

    fn get_tag(&self, _: (), link: &u32) -> nfc::Result<()> {
        assert_eq!(LINK, *link);
        self.tags_read.set(self.tags_read.get() + 1);

        match self.tag_fails {
            true => Err(nfc::Error::other("no tag")),
            _ => Ok(()),
        }
    }

    fn transceive(&self, _: (), link: &u32, command: &[u8]) -> nfc::Result<Vec<u8>> {
        self.exchange(Exchange::Transceive, link, command)
    }

    fn send_mifare_command(&self, _: (), link: &u32, command: &[u8]) -> nfc::Result<Vec<u8>> {
        self.exchange(Exchange::MifareCommand, link, command)
    }

    fn release(&self, _: (), link: Option<u32>) -> nfc::Result<()> {
        self.released.borrow_mut().push(link);

        match self.release_fails {
            true => Err(nfc::Error::other("cancelTechnologyRequest failed")),
            _ => Ok(()),
        }
    }
}

/// A successful response with the payload, followed by the status bytes.
pub fn ok(payload: &[u8]) -> Option<Vec<u8>> {
    let mut response = payload.to_vec();
    response.extend_from_slice(&[0x91, 0x00]);
    Some(response)
}

/// A response the card application rejected.
pub fn rejected() -> Option<Vec<u8>> {
    Some(vec![0x91, 0xAE, 0x6A, 0x82])
}

/// Balance of 5.000, stored little-endian.
pub fn balance_response() -> Option<Vec<u8>> {
    ok(&[0x88, 0x13, 0x00, 0x00])
}

/// Transaction log record with an amount of 0.100 at offset 12.
pub fn transaction_response() -> Option<Vec<u8>> {
    let mut record = vec![0x00; 12];
    record.extend_from_slice(&[0x64, 0x00]);
    record.extend_from_slice(&[0x00; 2]);
    ok(&record)
}
