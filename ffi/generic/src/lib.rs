#![allow(clippy::missing_safety_doc)]

use std::ffi::{c_char, c_void, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::null_mut;
use std::time::UNIX_EPOCH;

use mensacard::nfc::{self, LinkProvider, RequestOptions, Technology};
use mensacard::{read_card_information, CardReading, Config};
use tracing_subscriber::EnvFilter;

/// Largest response a short APDU can carry, including the status bytes.
const MAX_RESPONSE_SIZE: usize = 258;

/// Platform of the host, selecting the technology and the exchange mechanism.
#[repr(C)]
#[derive(Copy, Clone)]
pub enum MensacardPlatform {
    Android = 0,
    Ios = 1,
}

impl From<MensacardPlatform> for nfc::Platform {
    fn from(platform: MensacardPlatform) -> Self {
        match platform {
            MensacardPlatform::Android => nfc::Platform::Android,
            MensacardPlatform::Ios => nfc::Platform::Ios,
        }
    }
}

/// Technology the host is asked to request.
#[repr(C)]
#[derive(Copy, Clone)]
pub enum MensacardTechnology {
    IsoDep = 0,
    MifareIos = 1,
}

impl From<Technology> for MensacardTechnology {
    fn from(technology: Technology) -> Self {
        match technology {
            Technology::IsoDep => MensacardTechnology::IsoDep,
            Technology::MifareIos => MensacardTechnology::MifareIos,
        }
    }
}

/// Callbacks into the NFC stack of the host.
/// Every callback receives `user_data` as is.
///
/// `request_technology`, `get_tag` and `release` return false on failure.
/// `transceive` and `send_mifare_command` write the response into `response`, which can hold
/// `capacity` octets, and return its length, or a negative value on failure.
#[repr(C)]
pub struct MensacardLinkProvider {
    pub user_data: *mut c_void,
    pub request_technology: extern "C" fn(
        user_data: *mut c_void,
        technology: MensacardTechnology,
        alert_message: *const c_char,
    ) -> bool,
    pub get_tag: extern "C" fn(user_data: *mut c_void) -> bool,
    pub transceive: extern "C" fn(
        user_data: *mut c_void,
        command: *const u8,
        len: usize,
        response: *mut u8,
        capacity: usize,
    ) -> isize,
    pub send_mifare_command: extern "C" fn(
        user_data: *mut c_void,
        command: *const u8,
        len: usize,
        response: *mut u8,
        capacity: usize,
    ) -> isize,
    pub release: extern "C" fn(user_data: *mut c_void) -> bool,
}

type Exchange = extern "C" fn(*mut c_void, *const u8, usize, *mut u8, usize) -> isize;

impl MensacardLinkProvider {
    fn exchange(&self, delegate: Exchange, command: &[u8]) -> nfc::Result<Vec<u8>> {
        let mut response = vec![0u8; MAX_RESPONSE_SIZE];
        let len = delegate(
            self.user_data,
            command.as_ptr(),
            command.len(),
            response.as_mut_ptr(),
            response.len(),
        );

        match usize::try_from(len) {
            Ok(len) if len <= response.len() => {
                response.truncate(len);
                Ok(response)
            }
            Ok(len) => Err(nfc::Error::NotEnoughBuffer(len)),
            Err(_) => Err(nfc::Error::other("the host failed to exchange the command")),
        }
    }
}

type Ctx = ();

impl LinkProvider<Ctx> for MensacardLinkProvider {
    // The host keeps the session on its side.
    type Link = ();
    type Tag = ();

    fn request_technology(
        &self,
        _: Ctx,
        kind: Technology,
        options: &RequestOptions,
    ) -> nfc::Result<Option<()>> {
        let alert_message = CString::new(options.alert_message.as_str()).map_err(nfc::Error::other)?;

        match (self.request_technology)(self.user_data, kind.into(), alert_message.as_ptr()) {
            true => Ok(Some(())),
            _ => Ok(None),
        }
    }

    fn get_tag(&self, _: Ctx, _: &()) -> nfc::Result<()> {
        match (self.get_tag)(self.user_data) {
            true => Ok(()),
            _ => Err(nfc::Error::other("the host failed to get the tag")),
        }
    }

    fn transceive(&self, _: Ctx, _: &(), command: &[u8]) -> nfc::Result<Vec<u8>> {
        self.exchange(self.transceive, command)
    }

    fn send_mifare_command(&self, _: Ctx, _: &(), command: &[u8]) -> nfc::Result<Vec<u8>> {
        self.exchange(self.send_mifare_command, command)
    }

    fn release(&self, _: Ctx, _: Option<()>) -> nfc::Result<()> {
        match (self.release)(self.user_data) {
            true => Ok(()),
            _ => Err(nfc::Error::other("the host failed to release the technology")),
        }
    }
}

/// Outcome of a read.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MensacardReadingStatus {
    /// Both the balance and the last transaction were read.
    Complete = 0,
    /// Only the balance was read; `last_transaction` is "error".
    Partial = 1,
    /// Nothing was read; both strings are null.
    Absent = 2,
}

/// A reading handed over to the host.
/// Must be freed with `mensacard_reading_free`.
#[repr(C)]
pub struct MensacardReading {
    pub status: MensacardReadingStatus,
    pub current_balance: *mut c_char,
    pub last_transaction: *mut c_char,
    /// Milliseconds since the Unix epoch.
    pub read_time_ms: u64,
}

impl From<Option<CardReading>> for MensacardReading {
    fn from(reading: Option<CardReading>) -> Self {
        let reading = match reading {
            Some(reading) => reading,
            None => {
                return Self {
                    status: MensacardReadingStatus::Absent,
                    current_balance: null_mut(),
                    last_transaction: null_mut(),
                    read_time_ms: 0,
                }
            }
        };

        Self {
            status: match reading.is_complete() {
                true => MensacardReadingStatus::Complete,
                _ => MensacardReadingStatus::Partial,
            },
            current_balance: into_raw_string(reading.current_balance),
            last_transaction: into_raw_string(reading.last_transaction),
            read_time_ms: reading
                .read_time
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default(),
        }
    }
}

fn into_raw_string(s: String) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(null_mut())
}

/// Initiates the libmensacard_ffi library.
/// Installs a logger writing to stderr, filtered by `RUST_LOG`.
/// Calling this more than once has no effect.
#[no_mangle]
pub extern "C" fn mensacard_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Reads the balance and the last transaction through the provider.
/// `alert_message` may be null to use the default prompt.
/// Blocks until the session is over, and always calls `release` once before returning.
/// A panic inside the library is reported as an absent reading.
#[no_mangle]
pub unsafe extern "C" fn mensacard_read_card_information(
    provider: *const MensacardLinkProvider,
    platform: MensacardPlatform,
    alert_message: *const c_char,
) -> MensacardReading {
    let provider = match provider.as_ref() {
        Some(provider) => provider,
        None => return MensacardReading::from(None),
    };

    let mut config = Config::new(platform.into());
    if !alert_message.is_null() {
        config = config.with_alert_message(CStr::from_ptr(alert_message).to_string_lossy());
    }

    match panic::catch_unwind(AssertUnwindSafe(|| read_card_information((), provider, &config))) {
        Ok(reading) => reading.into(),
        Err(_) => MensacardReading::from(None),
    }
}

/// Frees the strings of the reading.
#[no_mangle]
pub unsafe extern "C" fn mensacard_reading_free(reading: MensacardReading) {
    for ptr in [reading.current_balance, reading.last_transaction] {
        if !ptr.is_null() {
            let _ = CString::from_raw(ptr);
        }
    }
}
