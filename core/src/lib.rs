//! A crate to read the balance and the last transaction from a Mensa card through a link delegate.
//!
//! The only entry point most users need is [`read_card_information`]: hand it a
//! [`nfc::LinkProvider`] that talks to the NFC stack of your platform, and it returns the
//! [`CardReading`] or `None` when the card could not be read at all.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, info, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! info {
    ($($t: tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn {
    ($($t: tt)*) => {{}};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {debug, info, warn};

#[cfg(feature = "pcsc")]
pub mod pcsc;

pub mod apdu;
pub mod card;
pub mod nfc;
pub mod reading;
pub mod runner;
pub mod value;

pub use card::{CardSession, Config};
pub use reading::CardReading;
pub use runner::read_card_information;
