use solana_program::pubkey::Pubkey;

use crate::instructions::SQUADS_PROGRAM_ID;

pub const SEED_PREFIX: &[u8] = b"multisig";
pub const SEED_PROGRAM_CONFIG: &[u8] = b"program_config";
pub const SEED_MULTISIG: &[u8] = b"multisig";
pub const SEED_VAULT: &[u8] = b"vault";
pub const SEED_TRANSACTION: &[u8] = b"transaction";
pub const SEED_PROPOSAL: &[u8] = b"proposal";
pub const SEED_EPHEMERAL_SIGNER: &[u8] = b"ephemeral_signer";

/// Multisig settings account, unique per create key.
pub fn multisig_pda(create_key: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[SEED_PREFIX, SEED_MULTISIG, create_key.as_ref()],
        &SQUADS_PROGRAM_ID,
    )
}

pub fn program_config_pda() -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SEED_PREFIX, SEED_PROGRAM_CONFIG], &SQUADS_PROGRAM_ID)
}

/// Vault holding the funds controlled by the multisig.
pub fn vault_pda(multisig: &Pubkey, index: u8) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[SEED_PREFIX, multisig.as_ref(), SEED_VAULT, &[index]],
        &SQUADS_PROGRAM_ID,
    )
}

pub fn transaction_pda(multisig: &Pubkey, transaction_index: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            SEED_PREFIX,
            multisig.as_ref(),
            SEED_TRANSACTION,
            &transaction_index.to_le_bytes(),
        ],
        &SQUADS_PROGRAM_ID,
    )
}

pub fn proposal_pda(multisig: &Pubkey, transaction_index: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            SEED_PREFIX,
            multisig.as_ref(),
            SEED_TRANSACTION,
            &transaction_index.to_le_bytes(),
            SEED_PROPOSAL,
        ],
        &SQUADS_PROGRAM_ID,
    )
}

pub fn ephemeral_signer_pda(transaction: &Pubkey, index: u8) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            SEED_PREFIX,
            transaction.as_ref(),
            SEED_EPHEMERAL_SIGNER,
            &[index],
        ],
        &SQUADS_PROGRAM_ID,
    )
}
