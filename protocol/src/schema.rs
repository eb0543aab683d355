//! # Contract Interfaces
//!
//! A remote contract call is positional and typed: argument `n` must carry
//! exactly the type the contract declares for parameter `n`, or the call
//! fails remotely with an unhelpful host error. [`ContractSchema`] holds the
//! declared interface and checks every call locally, before anything is
//! encoded or sent.

use crate::error::ClientError;
use crate::value::{ScValue, ValueType};

use crate::value::ValueType::{Address as Addr, I128, String as Str, U32, U64};

/// Declared signature of one contract method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: &'static str,
    pub params: &'static [ValueType],
    /// Whether the method changes contract state and must be signed.
    pub mutates: bool,
}

const fn read(name: &'static str, params: &'static [ValueType]) -> MethodSignature {
    MethodSignature {
        name,
        params,
        mutates: false,
    }
}

const fn write(name: &'static str, params: &'static [ValueType]) -> MethodSignature {
    MethodSignature {
        name,
        params,
        mutates: true,
    }
}

const MARKETPLACE: &[MethodSignature] = &[
    write("mint_time_token", &[Addr, I128, U32, Str]),
    write("purchase_token", &[U64, Addr, U32]),
    write("delete_token", &[U64, Addr]),
    write("update_availability", &[U64, Addr, U32]),
    write("list_on_secondary", &[U64, Addr, I128]),
    write("buy_from_secondary", &[U64, Addr, Addr]),
    write("redeem_receipt", &[U64, Addr]),
    read("get_token", &[U64]),
    read("get_token_count", &[]),
    read("get_seller_tokens", &[Addr]),
    read("get_receipt", &[U64]),
    read("get_receipt_count", &[]),
    read("get_owner_receipts", &[Addr]),
    read("get_listing", &[U64]),
];

const DICE_GAME: &[MethodSignature] = &[
    write("create_game", &[Addr, I128]),
    write("join_game", &[U64, Addr]),
    write("play_game", &[U64]),
    read("view_game", &[U64]),
];

/// The declared interface of a deployed contract.
#[derive(Debug, Clone, Copy)]
pub struct ContractSchema {
    name: &'static str,
    methods: &'static [MethodSignature],
}

impl ContractSchema {
    /// The time-token marketplace contract.
    pub const fn marketplace() -> Self {
        Self {
            name: "marketplace",
            methods: MARKETPLACE,
        }
    }

    /// The dice game contract.
    pub const fn dice_game() -> Self {
        Self {
            name: "dice_game",
            methods: DICE_GAME,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Looks up a method by name.
    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Verifies that `args` match the declared parameters of `method`.
    pub fn check(&self, method: &str, args: &[ScValue]) -> Result<&MethodSignature, ClientError> {
        let mismatch = |reason: String| ClientError::SchemaMismatch {
            method: method.to_string(),
            reason,
        };

        let signature = self
            .method(method)
            .ok_or_else(|| mismatch(format!("no such method on the {} contract", self.name)))?;

        if signature.params.len() != args.len() {
            return Err(mismatch(format!(
                "expected {} argument(s), got {}",
                signature.params.len(),
                args.len()
            )));
        }

        for (position, (expected, arg)) in signature.params.iter().zip(args).enumerate() {
            let found = arg.value_type();
            if *expected != found {
                return Err(mismatch(format!(
                    "argument {position} must be {expected}, got {found}"
                )));
            }
        }

        Ok(signature)
    }
}
