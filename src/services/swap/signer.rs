// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::data::abi::KuruRouter;
use crate::network::chain::FeeEstimate;
use crate::services::swap::builder::UnsignedSwap;
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::{Decodable2718, Encodable2718};
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, Bytes, TxKind, U256, uint};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use thiserror::Error;

/// Order of the secp256k1 group; valid secret scalars are in `[1, n)`.
const SECP256K1_ORDER: U256 =
    uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("private key must be 0x followed by 64 hex characters")]
    Format,
    #[error("private key is outside the valid secp256k1 range")]
    OutOfRange,
}

/// Check a hex private key and turn it into a signer. The key text never
/// appears in the error.
pub fn validate_private_key(raw: &str) -> Result<PrivateKeySigner, KeyError> {
    let body = raw.trim().strip_prefix("0x").ok_or(KeyError::Format)?;
    if body.len() != 64 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KeyError::Format);
    }
    let bytes = hex::decode(body).map_err(|_| KeyError::Format)?;
    let secret = B256::from_slice(&bytes);

    let scalar = U256::from_be_bytes(secret.0);
    if scalar.is_zero() || scalar >= SECP256K1_ORDER {
        return Err(KeyError::OutOfRange);
    }
    PrivateKeySigner::from_bytes(&secret).map_err(|_| KeyError::OutOfRange)
}

/// Hex encoding used for storage and export.
pub fn private_key_hex(signer: &PrivateKeySigner) -> String {
    format!("0x{}", hex::encode(signer.to_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSwap {
    pub raw: Bytes,
    pub tx_hash: B256,
    pub nonce: u64,
}

#[derive(Error, Debug)]
#[error("sign swap failed: {0}")]
pub struct SignError(String);

pub fn sign_swap(
    signer: &PrivateKeySigner,
    unsigned: &UnsignedSwap,
    chain_id: u64,
    nonce: u64,
    fees: FeeEstimate,
) -> Result<SignedSwap, SignError> {
    let mut tx = TxEip1559 {
        chain_id,
        nonce,
        gas_limit: unsigned.gas_limit,
        max_fee_per_gas: fees.max_fee_per_gas,
        max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        to: TxKind::Call(unsigned.router),
        value: unsigned.value,
        access_list: Default::default(),
        input: unsigned.calldata.clone(),
    };

    let sig = TxSignerSync::sign_transaction_sync(signer, &mut tx)
        .map_err(|e| SignError(e.to_string()))?;
    let signed: TxEnvelope = tx.into_signed(sig).into();
    let raw = signed.encoded_2718();
    Ok(SignedSwap {
        raw: Bytes::from(raw),
        tx_hash: *signed.tx_hash(),
        nonce,
    })
}

/// Fields of a signed router call, as a node would see them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSwap {
    pub sender: Address,
    pub router: Address,
    pub nonce: u64,
    pub value: U256,
    pub amount_in: U256,
    pub min_amount_out: U256,
    pub market: Address,
}

pub fn decode_signed_swap(raw: &[u8]) -> Result<DecodedSwap, String> {
    let envelope =
        TxEnvelope::decode_2718(&mut &raw[..]).map_err(|e| format!("bad envelope: {e}"))?;
    let TxEnvelope::Eip1559(signed) = envelope else {
        return Err("not an EIP-1559 transaction".into());
    };

    let sender = signed
        .signature()
        .recover_address_from_prehash(&signed.signature_hash())
        .map_err(|e| format!("signature recovery failed: {e}"))?;
    let tx = signed.tx();
    let TxKind::Call(router) = tx.to else {
        return Err("contract creation is not a swap".into());
    };
    let call = KuruRouter::anyToAnySwapCall::abi_decode(&tx.input)
        .map_err(|e| format!("not an anyToAnySwap call: {e}"))?;
    let market = call
        ._marketAddresses
        .first()
        .copied()
        .ok_or_else(|| "empty route".to_string())?;

    Ok(DecodedSwap {
        sender,
        router,
        nonce: tx.nonce,
        value: tx.value,
        amount_in: call._amount,
        min_amount_out: call._minAmountOut,
        market,
    })
}
