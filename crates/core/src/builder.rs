//! Builds and signs legacy value-transfer transactions. Everything here is
//! offline; nothing touches the network until the raw bytes are submitted.

use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    network::TxSignerSync,
    primitives::{Address, Bytes, TxHash, TxKind, U256},
    signers::local::PrivateKeySigner,
};

use crate::{error::Error, Result};

/// Gas burned by a plain value transfer. Used wherever the caller does not
/// override the gas limit.
pub const GAS_PLAIN_TRANSFER: u64 = 21_000;

/// Everything needed to build one transaction, minus the key material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxParams {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub chain_id: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl TxParams {
    /// Params for a plain transfer: 21k gas, zero value, empty calldata.
    pub fn transfer(nonce: u64, gas_price: u128, chain_id: u64, to: Address) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit: GAS_PLAIN_TRANSFER,
            chain_id,
            to,
            value: U256::ZERO,
            data: Bytes::new(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}

/// A signed, EIP-2718-encoded transaction. Immutable once produced.
#[derive(Clone, Debug)]
pub struct SignedTx {
    pub hash: TxHash,
    pub raw: Bytes,
}

/// Signs `params` with `signer` and returns the encoded result.
///
/// Deterministic for identical inputs; ECDSA nonces come from RFC 6979, so
/// re-signing the same params yields the same bytes and hash.
pub fn build(params: &TxParams, signer: &PrivateKeySigner) -> Result<SignedTx> {
    if params.gas_price == 0 {
        return Err(Error::TxBuild("gas price must be nonzero".to_owned()));
    }
    let mut tx = TxLegacy {
        chain_id: Some(params.chain_id),
        nonce: params.nonce,
        gas_price: params.gas_price,
        gas_limit: params.gas_limit,
        to: TxKind::Call(params.to),
        value: params.value,
        input: params.data.to_owned(),
    };
    let signature = signer.sign_transaction_sync(&mut tx)?;
    let tx = TxEnvelope::from(tx.into_signed(signature));
    Ok(SignedTx {
        hash: *tx.tx_hash(),
        raw: tx.encoded_2718().into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::eips::eip2718::Decodable2718;

    fn test_signer() -> PrivateKeySigner {
        // first default anvil key
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap()
    }

    #[test]
    fn signed_tx_round_trips_every_field() {
        let signer = test_signer();
        let to = Address::repeat_byte(0x42);
        let params = TxParams::transfer(7, 2_000_000_000, 31337, to).with_value(U256::from(1000));
        let signed = build(&params, &signer).unwrap();

        let decoded = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
        assert_eq!(*decoded.tx_hash(), signed.hash);
        let TxEnvelope::Legacy(tx) = decoded else {
            panic!("expected a legacy envelope");
        };
        assert_eq!(tx.recover_signer().unwrap(), signer.address());

        let tx = tx.tx();
        assert_eq!(tx.chain_id, Some(31337));
        assert_eq!(tx.nonce, 7);
        assert_eq!(tx.gas_price, 2_000_000_000);
        assert_eq!(tx.gas_limit, GAS_PLAIN_TRANSFER);
        assert_eq!(tx.to, TxKind::Call(to));
        assert_eq!(tx.value, U256::from(1000));
        assert!(tx.input.is_empty());
    }

    #[test]
    fn identical_params_sign_identically() {
        let signer = test_signer();
        let params = TxParams::transfer(0, 1_000_000_000, 1, Address::ZERO);
        let a = build(&params, &signer).unwrap();
        let b = build(&params, &signer).unwrap();
        assert_eq!(a.raw, b.raw);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn rejects_zero_gas_price() {
        let params = TxParams::transfer(0, 0, 1, Address::ZERO);
        let res = build(&params, &test_signer());
        assert!(matches!(res, Err(Error::TxBuild(_))));
    }

    #[test]
    fn gas_limit_override_applies() {
        let params = TxParams::transfer(0, 1, 1, Address::ZERO).with_gas_limit(50_000);
        assert_eq!(params.gas_limit, 50_000);
        assert_eq!(params.value, U256::ZERO);
    }
}
