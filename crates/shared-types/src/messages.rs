//! # Transaction Messages
//!
//! The message set an application node accepts: bank transfers, contract
//! lifecycle messages and cross-chain relay messages.
//!
//! Every message:
//! - validates its own structure (`validate_basic`) without touching state
//! - reports its type URL (used for per-type transaction accounting)
//! - reports the addresses that must sign it
//!
//! Relay messages additionally expose the packet they deliver so the
//! redundant-relay check can consult the relay registry.

use crate::entities::{Address, Coins, ZERO_ADDRESS};
use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// Maximum stored contract code size (800 KiB).
pub const MAX_WASM_SIZE: usize = 800 * 1024;

/// Maximum contract label length.
pub const MAX_LABEL_SIZE: usize = 128;

/// Identifier length bounds for ports, channels and clients.
const IDENTIFIER_MIN_LEN: usize = 2;
const IDENTIFIER_MAX_LEN: usize = 64;

// =============================================================================
// BANK & CONTRACT MESSAGES
// =============================================================================

/// Transfer coins between accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from_address: Address,
    pub to_address: Address,
    pub amount: Coins,
}

/// Upload contract code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgStoreCode {
    pub sender: Address,
    pub wasm_byte_code: Vec<u8>,
}

/// Instantiate a contract from stored code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgInstantiateContract {
    pub sender: Address,
    pub admin: Option<Address>,
    pub code_id: u64,
    pub label: String,
    /// JSON-encoded instantiate message.
    pub msg: Vec<u8>,
    pub funds: Coins,
}

/// Execute a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgExecuteContract {
    pub sender: Address,
    pub contract: Address,
    /// JSON-encoded execute message.
    pub msg: Vec<u8>,
    pub funds: Coins,
}

// =============================================================================
// RELAY MESSAGES
// =============================================================================

/// A cross-chain packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub destination_port: String,
    pub destination_channel: String,
    pub data: Vec<u8>,
    pub timeout_height: u64,
    pub timeout_timestamp: u64,
}

impl Packet {
    /// Structural packet checks.
    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        validate_identifier("source port", &self.source_port)?;
        validate_identifier("source channel", &self.source_channel)?;
        validate_identifier("destination port", &self.destination_port)?;
        validate_identifier("destination channel", &self.destination_channel)?;
        if self.sequence == 0 {
            return Err(ValidationError::ZeroValue("packet sequence"));
        }
        if self.timeout_height == 0 && self.timeout_timestamp == 0 {
            return Err(ValidationError::MissingPacketTimeout);
        }
        if self.data.is_empty() {
            return Err(ValidationError::EmptyField("packet data"));
        }
        Ok(())
    }

    /// Identifier of the packet on the receiving end.
    pub fn destination_id(&self) -> PacketId {
        PacketId {
            port_id: self.destination_port.clone(),
            channel_id: self.destination_channel.clone(),
            sequence: self.sequence,
        }
    }

    /// Identifier of the packet on the sending end.
    pub fn source_id(&self) -> PacketId {
        PacketId {
            port_id: self.source_port.clone(),
            channel_id: self.source_channel.clone(),
            sequence: self.sequence,
        }
    }
}

/// Identifies a packet within a channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketId {
    pub port_id: String,
    pub channel_id: String,
    pub sequence: u64,
}

/// What a relay message does with its packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelayAction {
    /// Deliver the packet to the destination (receipt written).
    Receive,
    /// Deliver the acknowledgement back to the source.
    Acknowledge,
    /// Time the packet out on the source (incl. on channel close).
    Timeout,
}

/// Deliver a packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRecvPacket {
    pub packet: Packet,
    pub proof_commitment: Vec<u8>,
    pub proof_height: u64,
    pub signer: Address,
}

/// Deliver a packet acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAcknowledgement {
    pub packet: Packet,
    pub acknowledgement: Vec<u8>,
    pub proof_acked: Vec<u8>,
    pub proof_height: u64,
    pub signer: Address,
}

/// Time out a packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTimeout {
    pub packet: Packet,
    pub proof_unreceived: Vec<u8>,
    pub proof_height: u64,
    pub next_sequence_recv: u64,
    pub signer: Address,
}

/// Time out a packet because the counterparty channel closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTimeoutOnClose {
    pub packet: Packet,
    pub proof_unreceived: Vec<u8>,
    pub proof_close: Vec<u8>,
    pub proof_height: u64,
    pub next_sequence_recv: u64,
    pub signer: Address,
}

/// Update a light client with a new header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateClient {
    pub client_id: String,
    pub header: Vec<u8>,
    pub signer: Address,
}

// =============================================================================
// MSG
// =============================================================================

/// A transaction message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Msg {
    Send(MsgSend),
    StoreCode(MsgStoreCode),
    InstantiateContract(MsgInstantiateContract),
    ExecuteContract(MsgExecuteContract),
    RecvPacket(MsgRecvPacket),
    Acknowledgement(MsgAcknowledgement),
    Timeout(MsgTimeout),
    TimeoutOnClose(MsgTimeoutOnClose),
    UpdateClient(MsgUpdateClient),
}

impl Msg {
    /// Fully-qualified message type name.
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::Send(_) => "/bank.v1.MsgSend",
            Self::StoreCode(_) => "/wasm.v1.MsgStoreCode",
            Self::InstantiateContract(_) => "/wasm.v1.MsgInstantiateContract",
            Self::ExecuteContract(_) => "/wasm.v1.MsgExecuteContract",
            Self::RecvPacket(_) => "/relay.channel.v1.MsgRecvPacket",
            Self::Acknowledgement(_) => "/relay.channel.v1.MsgAcknowledgement",
            Self::Timeout(_) => "/relay.channel.v1.MsgTimeout",
            Self::TimeoutOnClose(_) => "/relay.channel.v1.MsgTimeoutOnClose",
            Self::UpdateClient(_) => "/relay.client.v1.MsgUpdateClient",
        }
    }

    /// Addresses that must sign this message, in order.
    pub fn signers(&self) -> Vec<Address> {
        let signer = match self {
            Self::Send(m) => m.from_address,
            Self::StoreCode(m) => m.sender,
            Self::InstantiateContract(m) => m.sender,
            Self::ExecuteContract(m) => m.sender,
            Self::RecvPacket(m) => m.signer,
            Self::Acknowledgement(m) => m.signer,
            Self::Timeout(m) => m.signer,
            Self::TimeoutOnClose(m) => m.signer,
            Self::UpdateClient(m) => m.signer,
        };
        vec![signer]
    }

    /// Packet delivered by this message, for packet relay messages.
    ///
    /// `UpdateClient` is a relay message but carries no packet.
    pub fn relay_packet(&self) -> Option<(RelayAction, PacketId)> {
        match self {
            Self::RecvPacket(m) => Some((RelayAction::Receive, m.packet.destination_id())),
            Self::Acknowledgement(m) => Some((RelayAction::Acknowledge, m.packet.source_id())),
            Self::Timeout(m) => Some((RelayAction::Timeout, m.packet.source_id())),
            Self::TimeoutOnClose(m) => Some((RelayAction::Timeout, m.packet.source_id())),
            _ => None,
        }
    }

    /// Returns true for packet relay and client update messages.
    pub fn is_relay(&self) -> bool {
        self.relay_packet().is_some() || matches!(self, Self::UpdateClient(_))
    }

    /// Stateless structural validation.
    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        match self {
            Self::Send(m) => {
                require_address("from", &m.from_address)?;
                require_address("to", &m.to_address)?;
                validate_coins("amount", &m.amount)?;
                if m.amount.is_empty() {
                    return Err(ValidationError::EmptyField("amount"));
                }
                Ok(())
            }
            Self::StoreCode(m) => {
                require_address("sender", &m.sender)?;
                if m.wasm_byte_code.is_empty() {
                    return Err(ValidationError::EmptyField("wasm byte code"));
                }
                if m.wasm_byte_code.len() > MAX_WASM_SIZE {
                    return Err(ValidationError::TooLarge {
                        field: "wasm byte code",
                        size: m.wasm_byte_code.len(),
                        max: MAX_WASM_SIZE,
                    });
                }
                Ok(())
            }
            Self::InstantiateContract(m) => {
                require_address("sender", &m.sender)?;
                if let Some(admin) = &m.admin {
                    require_address("admin", admin)?;
                }
                if m.code_id == 0 {
                    return Err(ValidationError::ZeroValue("code id"));
                }
                if m.label.trim().is_empty() {
                    return Err(ValidationError::EmptyField("label"));
                }
                if m.label.len() > MAX_LABEL_SIZE {
                    return Err(ValidationError::TooLarge {
                        field: "label",
                        size: m.label.len(),
                        max: MAX_LABEL_SIZE,
                    });
                }
                validate_coins("funds", &m.funds)?;
                validate_json("msg", &m.msg)
            }
            Self::ExecuteContract(m) => {
                require_address("sender", &m.sender)?;
                require_address("contract", &m.contract)?;
                validate_coins("funds", &m.funds)?;
                validate_json("msg", &m.msg)
            }
            Self::RecvPacket(m) => {
                require_proof("commitment proof", &m.proof_commitment)?;
                require_address("signer", &m.signer)?;
                m.packet.validate_basic()
            }
            Self::Acknowledgement(m) => {
                require_proof("acknowledgement proof", &m.proof_acked)?;
                if m.acknowledgement.is_empty() {
                    return Err(ValidationError::EmptyField("acknowledgement"));
                }
                require_address("signer", &m.signer)?;
                m.packet.validate_basic()
            }
            Self::Timeout(m) => {
                require_proof("unreceived proof", &m.proof_unreceived)?;
                if m.next_sequence_recv == 0 {
                    return Err(ValidationError::ZeroValue("next sequence recv"));
                }
                require_address("signer", &m.signer)?;
                m.packet.validate_basic()
            }
            Self::TimeoutOnClose(m) => {
                require_proof("unreceived proof", &m.proof_unreceived)?;
                require_proof("close proof", &m.proof_close)?;
                if m.next_sequence_recv == 0 {
                    return Err(ValidationError::ZeroValue("next sequence recv"));
                }
                require_address("signer", &m.signer)?;
                m.packet.validate_basic()
            }
            Self::UpdateClient(m) => {
                validate_identifier("client", &m.client_id)?;
                if m.header.is_empty() {
                    return Err(ValidationError::EmptyField("client header"));
                }
                require_address("signer", &m.signer)
            }
        }
    }
}

fn require_address(field: &'static str, address: &Address) -> Result<(), ValidationError> {
    if *address == ZERO_ADDRESS {
        return Err(ValidationError::InvalidAddress { field });
    }
    Ok(())
}

fn require_proof(field: &'static str, proof: &[u8]) -> Result<(), ValidationError> {
    if proof.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn validate_coins(field: &'static str, coins: &Coins) -> Result<(), ValidationError> {
    coins
        .validate()
        .map_err(|source| ValidationError::InvalidCoins { field, source })
}

fn validate_json(field: &'static str, raw: &[u8]) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    serde_json::from_slice::<serde::de::IgnoredAny>(raw)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidJson {
            field,
            reason: e.to_string(),
        })
}

/// Host identifier rules: 2..=64 chars of `[a-zA-Z0-9._+\-#\[\]<>]`.
pub fn validate_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let valid_len = (IDENTIFIER_MIN_LEN..=IDENTIFIER_MAX_LEN).contains(&value.len());
    let valid_chars = value.bytes().all(|b| {
        b.is_ascii_alphanumeric()
            || matches!(b, b'.' | b'_' | b'+' | b'-' | b'#' | b'[' | b']' | b'<' | b'>')
    });
    if !valid_len || !valid_chars {
        return Err(ValidationError::InvalidIdentifier {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
