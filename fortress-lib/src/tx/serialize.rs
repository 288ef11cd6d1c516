//! Exact transaction serialization.
//!
//! Fee computation multiplies the serialized byte length by a fixed rate,
//! so the encoding here must match what eventually hits the wire byte for
//! byte. Input scripts carry fixed-length placeholder signatures and keys
//! until signing, which keeps the unsigned length equal to the signed one.

use crate::{FortressError, Result};

/// Default sequence for vault inputs.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// Transaction version emitted by the builder.
pub const TX_VERSION: u32 = 2;

/// One transaction input, unlocking script included (placeholder form
/// until signed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    /// Funding txid, big-endian display hex.
    pub txid: String,
    /// Funding output index.
    pub vout: u32,
    /// Unlocking script with placeholder signature/key material.
    pub unlocking_script: Vec<u8>,
    /// Value of the consumed output, used for fee arithmetic only.
    pub satoshis: u64,
    /// Sequence number.
    pub sequence: u32,
}

/// One transaction output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    /// Value in satoshis (zero for data-carrier outputs).
    pub satoshis: u64,
    /// Locking script.
    pub locking_script: Vec<u8>,
}

/// A fully laid-out transaction awaiting signatures.
///
/// Exclusively owned by the builder until handed to the signing
/// collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub locktime: u32,
}

impl UnsignedTransaction {
    /// Start an empty transaction with default version and locktime.
    pub fn new() -> Self {
        Self {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            locktime: 0,
        }
    }

    /// Sum of input values.
    pub fn input_sum(&self) -> u64 {
        self.inputs.iter().map(|i| i.satoshis).sum()
    }

    /// Sum of output values.
    pub fn output_sum(&self) -> u64 {
        self.outputs.iter().map(|o| o.satoshis).sum()
    }

    /// Serialize to wire bytes.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.serialized_len());
        out.extend_from_slice(&self.version.to_le_bytes());
        write_varint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            let mut txid = hex::decode(&input.txid).map_err(|e| {
                FortressError::Serialization(format!("input txid {}: {}", input.txid, e))
            })?;
            if txid.len() != 32 {
                return Err(FortressError::Serialization(format!(
                    "input txid {} is {} bytes",
                    input.txid,
                    txid.len()
                )));
            }
            txid.reverse();
            out.extend_from_slice(&txid);
            out.extend_from_slice(&input.vout.to_le_bytes());
            write_varint(&mut out, input.unlocking_script.len() as u64);
            out.extend_from_slice(&input.unlocking_script);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }
        write_varint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.satoshis.to_le_bytes());
            write_varint(&mut out, output.locking_script.len() as u64);
            out.extend_from_slice(&output.locking_script);
        }
        out.extend_from_slice(&self.locktime.to_le_bytes());
        Ok(out)
    }

    /// Serialize to hex.
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.serialize()?))
    }

    /// Exact wire length in bytes, without allocating the encoding.
    pub fn serialized_len(&self) -> usize {
        let mut len = 4 + 4; // version + locktime
        len += varint_len(self.inputs.len() as u64);
        for input in &self.inputs {
            len += 32 + 4 + 4; // outpoint + sequence
            len += varint_len(input.unlocking_script.len() as u64);
            len += input.unlocking_script.len();
        }
        len += varint_len(self.outputs.len() as u64);
        for output in &self.outputs {
            len += 8;
            len += varint_len(output.locking_script.len() as u64);
            len += output.locking_script.len();
        }
        len
    }
}

impl Default for UnsignedTransaction {
    fn default() -> Self {
        Self::new()
    }
}

/// Append a Bitcoin compact-size integer.
pub fn write_varint(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

/// Encoded size of a compact-size integer.
pub fn varint_len(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::script::{p2pkh_locking_script, p2pkh_placeholder_unlocking_script};

    fn sample_tx() -> UnsignedTransaction {
        let mut tx = UnsignedTransaction::new();
        tx.inputs.push(TxInput {
            txid: "11".repeat(32),
            vout: 1,
            unlocking_script: p2pkh_placeholder_unlocking_script(),
            satoshis: 50_000,
            sequence: SEQUENCE_FINAL,
        });
        tx.outputs.push(TxOutput {
            satoshis: 49_000,
            locking_script: p2pkh_locking_script(&[0x22u8; 20]),
        });
        tx
    }

    #[test]
    fn varint_boundaries() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 0xfc);
        write_varint(&mut buf, 0xfd);
        write_varint(&mut buf, 0x1_0000);
        assert_eq!(buf[0], 0xfc);
        assert_eq!(&buf[1..4], &[0xfd, 0xfd, 0x00]);
        assert_eq!(buf[4], 0xfe);
        assert_eq!(varint_len(0xfc), 1);
        assert_eq!(varint_len(0xfd), 3);
        assert_eq!(varint_len(0xffff), 3);
        assert_eq!(varint_len(0x1_0000), 5);
    }

    #[test]
    fn length_shortcut_matches_actual_encoding() {
        let tx = sample_tx();
        assert_eq!(tx.serialize().unwrap().len(), tx.serialized_len());
        // version(4) + varint(1) + outpoint(36) + varint(1) + script(100)
        // + seq(4) + varint(1) + value(8) + varint(1) + script(25) + locktime(4)
        assert_eq!(tx.serialized_len(), 185);
    }

    #[test]
    fn txid_bytes_are_reversed_on_the_wire() {
        let mut tx = sample_tx();
        tx.inputs[0].txid = format!("{}{}", "aa", "00".repeat(31));
        let bytes = tx.serialize().unwrap();
        // outpoint starts after version + input count varint
        assert_eq!(bytes[5], 0x00);
        assert_eq!(bytes[5 + 31], 0xaa);
    }

    #[test]
    fn malformed_txid_is_a_serialization_error() {
        let mut tx = sample_tx();
        tx.inputs[0].txid = "zz".repeat(32);
        assert!(tx.serialize().is_err());
        tx.inputs[0].txid = "11".repeat(16);
        assert!(tx.serialize().is_err());
    }
}
