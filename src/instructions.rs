use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_program::system_program;
use solana_sdk::pubkey;

use crate::pda;
use crate::state::{Member, VaultTransaction};

pub const SQUADS_PROGRAM_ID: Pubkey = pubkey!("SQDS4ep65T869zMMBKyuUq6aD6EgTu8psMjkvj52pCf");

const MULTISIG_CREATE_V2: [u8; 8] = [50, 221, 199, 93, 40, 245, 139, 233];
const VAULT_TRANSACTION_CREATE: [u8; 8] = [48, 250, 78, 168, 208, 226, 218, 211];
const PROPOSAL_CREATE: [u8; 8] = [220, 60, 73, 224, 30, 108, 79, 159];
const PROPOSAL_APPROVE: [u8; 8] = [144, 37, 164, 136, 188, 216, 42, 248];
const VAULT_TRANSACTION_EXECUTE: [u8; 8] = [194, 8, 161, 87, 153, 164, 25, 171];

#[derive(BorshSerialize, BorshDeserialize)]
pub struct MultisigCreateArgsV2 {
    pub config_authority: Option<Pubkey>,
    pub threshold: u16,
    pub members: Vec<Member>,
    pub time_lock: u32,
    pub rent_collector: Option<Pubkey>,
    pub memo: Option<String>,
}

#[derive(BorshSerialize, BorshDeserialize)]
pub struct VaultTransactionCreateArgs {
    pub vault_index: u8,
    pub ephemeral_signers: u8,
    pub transaction_message: Vec<u8>,
    pub memo: Option<String>,
}

#[derive(BorshSerialize, BorshDeserialize)]
pub struct ProposalCreateArgs {
    pub transaction_index: u64,
    pub draft: bool,
}

#[derive(BorshSerialize, BorshDeserialize)]
pub struct ProposalVoteArgs {
    pub memo: Option<String>,
}

fn anchor_data<T: BorshSerialize>(discriminator: [u8; 8], args: &T) -> Vec<u8> {
    let mut data = discriminator.to_vec();
    data.extend(borsh::to_vec(args).unwrap());
    data
}

pub fn multisig_create_v2(
    program_config: &Pubkey,
    treasury: &Pubkey,
    multisig: &Pubkey,
    create_key: &Pubkey,
    creator: &Pubkey,
    args: MultisigCreateArgsV2,
) -> Instruction {
    Instruction {
        program_id: SQUADS_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(*program_config, false),
            AccountMeta::new(*treasury, false),
            AccountMeta::new(*multisig, false),
            AccountMeta::new_readonly(*create_key, true),
            AccountMeta::new(*creator, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: anchor_data(MULTISIG_CREATE_V2, &args),
    }
}

pub fn vault_transaction_create(
    multisig: &Pubkey,
    transaction: &Pubkey,
    creator: &Pubkey,
    rent_payer: &Pubkey,
    args: VaultTransactionCreateArgs,
) -> Instruction {
    Instruction {
        program_id: SQUADS_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*multisig, false),
            AccountMeta::new(*transaction, false),
            AccountMeta::new_readonly(*creator, true),
            AccountMeta::new(*rent_payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: anchor_data(VAULT_TRANSACTION_CREATE, &args),
    }
}

pub fn proposal_create(
    multisig: &Pubkey,
    proposal: &Pubkey,
    creator: &Pubkey,
    rent_payer: &Pubkey,
    args: ProposalCreateArgs,
) -> Instruction {
    Instruction {
        program_id: SQUADS_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(*multisig, false),
            AccountMeta::new(*proposal, false),
            AccountMeta::new_readonly(*creator, true),
            AccountMeta::new(*rent_payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: anchor_data(PROPOSAL_CREATE, &args),
    }
}

pub fn proposal_approve(
    multisig: &Pubkey,
    member: &Pubkey,
    proposal: &Pubkey,
    args: ProposalVoteArgs,
) -> Instruction {
    Instruction {
        program_id: SQUADS_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(*multisig, false),
            AccountMeta::new(*member, true),
            AccountMeta::new(*proposal, false),
        ],
        data: anchor_data(PROPOSAL_APPROVE, &args),
    }
}

pub fn vault_transaction_execute(
    multisig: &Pubkey,
    proposal: &Pubkey,
    transaction: &Pubkey,
    member: &Pubkey,
    remaining_accounts: Vec<AccountMeta>,
) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new_readonly(*multisig, false),
        AccountMeta::new(*proposal, false),
        AccountMeta::new_readonly(*transaction, false),
        AccountMeta::new_readonly(*member, true),
    ];
    accounts.extend(remaining_accounts);
    Instruction {
        program_id: SQUADS_PROGRAM_ID,
        accounts,
        data: VAULT_TRANSACTION_EXECUTE.to_vec(),
    }
}

/// Account metas the program needs appended to `vault_transaction_execute`:
/// any address table lookup accounts first, then every key of the stored
/// message. The vault and ephemeral signer PDAs sign via CPI, so they are
/// never marked as transaction-level signers.
pub fn execute_account_metas(
    transaction: &VaultTransaction,
    transaction_pda: &Pubkey,
    vault: &Pubkey,
) -> Vec<AccountMeta> {
    let message = &transaction.message;
    let ephemeral_signers: Vec<Pubkey> = (0..transaction.ephemeral_signer_bumps.len() as u8)
        .map(|index| pda::ephemeral_signer_pda(transaction_pda, index).0)
        .collect();

    let mut metas =
        Vec::with_capacity(message.address_table_lookups.len() + message.account_keys.len());
    for lookup in &message.address_table_lookups {
        metas.push(AccountMeta::new_readonly(lookup.account_key, false));
    }
    for (index, key) in message.account_keys.iter().enumerate() {
        let is_signer = message.is_signer_index(index)
            && key != vault
            && !ephemeral_signers.contains(key);
        metas.push(AccountMeta {
            pubkey: *key,
            is_signer,
            is_writable: message.is_static_writable_index(index),
        });
    }
    metas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Permissions, VaultTransactionMessage};

    #[test]
    fn multisig_create_encoding() {
        let args = MultisigCreateArgsV2 {
            config_authority: None,
            threshold: 2,
            members: vec![
                Member {
                    key: Pubkey::new_unique(),
                    permissions: Permissions::all(),
                },
                Member {
                    key: Pubkey::new_unique(),
                    permissions: Permissions::vote_only(),
                },
            ],
            time_lock: 0,
            rent_collector: None,
            memo: None,
        };
        let ix = multisig_create_v2(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            args,
        );

        assert_eq!(ix.program_id, SQUADS_PROGRAM_ID);
        assert_eq!(&ix.data[..8], &MULTISIG_CREATE_V2);
        // 1 (None) + 2 + 4 + 2 * 33 + 4 + 1 (None) + 1 (None)
        assert_eq!(ix.data.len(), 8 + 79);

        assert_eq!(ix.accounts.len(), 6);
        let signers: Vec<bool> = ix.accounts.iter().map(|meta| meta.is_signer).collect();
        assert_eq!(signers, vec![false, false, false, true, true, false]);
        assert!(ix.accounts[1].is_writable); // treasury
        assert!(ix.accounts[2].is_writable); // multisig
        assert!(!ix.accounts[0].is_writable); // program config
    }

    #[test]
    fn proposal_create_encoding() {
        let ix = proposal_create(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            ProposalCreateArgs {
                transaction_index: 1,
                draft: false,
            },
        );
        let mut expected = PROPOSAL_CREATE.to_vec();
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.push(0);
        assert_eq!(ix.data, expected);
    }

    #[test]
    fn approve_without_memo_is_discriminator_plus_none() {
        let ix = proposal_approve(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            ProposalVoteArgs { memo: None },
        );
        let mut expected = PROPOSAL_APPROVE.to_vec();
        expected.push(0);
        assert_eq!(ix.data, expected);
        assert!(ix.accounts[1].is_signer); // member
        assert!(ix.accounts[2].is_writable); // proposal
    }

    #[test]
    fn execute_metas_never_mark_vault_as_signer() {
        let multisig = Pubkey::new_unique();
        let transaction_pda = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();

        let transaction = VaultTransaction {
            multisig,
            creator: Pubkey::new_unique(),
            index: 1,
            bump: 255,
            vault_index: 0,
            vault_bump: 254,
            ephemeral_signer_bumps: vec![253],
            message: VaultTransactionMessage {
                num_signers: 1,
                num_writable_signers: 1,
                num_writable_non_signers: 1,
                account_keys: vec![vault, recipient, system_program::ID],
                instructions: vec![],
                address_table_lookups: vec![],
            },
        };

        let metas = execute_account_metas(&transaction, &transaction_pda, &vault);
        assert_eq!(metas.len(), 3);
        assert_eq!(metas[0].pubkey, vault);
        assert!(!metas[0].is_signer);
        assert!(metas[0].is_writable);
        assert!(metas[1].is_writable);
        assert!(!metas[1].is_signer);
        assert!(!metas[2].is_writable);

        let ix = vault_transaction_execute(
            &multisig,
            &Pubkey::new_unique(),
            &transaction_pda,
            &Pubkey::new_unique(),
            metas,
        );
        assert_eq!(ix.data, VAULT_TRANSACTION_EXECUTE.to_vec());
        assert_eq!(ix.accounts.len(), 4 + 3);
        assert!(ix.accounts[3].is_signer); // executing member
    }
}
