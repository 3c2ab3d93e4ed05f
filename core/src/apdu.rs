//! APDU commands understood by the Mensa card application, and checks on its responses.

use std::fmt::{Display, Formatter};
use std::ops::Range;

use apdu::Command;

const CLA_NATIVE: u8 = 0x90;

const SELECT_APPLICATION_INS: u8 = 0x5A;
const GET_VALUE_INS: u8 = 0x6C;
const READ_RECORDS_INS: u8 = 0xF5;

const P1: u8 = 0x00;
const P2: u8 = 0x00;

/// Identifier of the application holding the balance and the transaction log.
const APPLICATION_ID: [u8; 3] = [0x5F, 0x84, 0x15];

/// File number of both the value file and the transaction log.
const FILE_NO: u8 = 0x01;

/// Status byte (SW1) the card application answers on success.
pub const STATUS_SUCCESS: u8 = 0x91;

/// Little-endian current balance, at the head of the `READ BALANCE` response.
pub const BALANCE_FIELD: Range<usize> = 0..4;

/// Little-endian amount of the last transaction in the `READ LAST TRANSACTION` response.
pub const TRANSACTION_FIELD: Range<usize> = 12..14;

/// The commands sent to the card, in protocol order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApduCommand {
    /// Selects the application holding the balance and the transaction log.
    SelectApplication,
    /// Reads the value file containing the current balance.
    ReadBalance,
    /// Reads the most recent record of the transaction log.
    ReadLastTransaction,
}

impl ApduCommand {
    /// Name of the command, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ApduCommand::SelectApplication => "SelectApplication",
            ApduCommand::ReadBalance => "ReadBalance",
            ApduCommand::ReadLastTransaction => "ReadLastTransaction",
        }
    }

    /// Octets of the command as sent on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let command = match self {
            ApduCommand::SelectApplication => Command::new_with_payload_le(
                CLA_NATIVE,
                SELECT_APPLICATION_INS,
                P1,
                P2,
                0,
                &APPLICATION_ID,
            ),
            ApduCommand::ReadBalance => {
                Command::new_with_payload_le(CLA_NATIVE, GET_VALUE_INS, P1, P2, 0, &[FILE_NO])
            }
            ApduCommand::ReadLastTransaction => {
                Command::new_with_payload_le(CLA_NATIVE, READ_RECORDS_INS, P1, P2, 0, &[FILE_NO])
            }
        };

        Vec::from(command)
    }
}

impl Display for ApduCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Determines whether the response indicates success.
/// Absent or too short responses are never valid.
pub fn is_valid_response(response: Option<&[u8]>) -> bool {
    match response {
        Some(bytes) if bytes.len() >= 2 => bytes[bytes.len() - 2] == STATUS_SUCCESS,
        _ => false,
    }
}

/// Extracts a little-endian field from the response and returns it most significant first.
/// The range is clamped to the response, so a short response yields the bytes it has.
pub fn field(response: &[u8], range: Range<usize>) -> Vec<u8> {
    let len = response.len();
    let start = range.start.min(len);
    let end = range.end.min(len);

    response[start..end].iter().rev().copied().collect()
}
