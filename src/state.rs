use std::io;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

pub const PERMISSION_INITIATE: u8 = 1 << 0;
pub const PERMISSION_VOTE: u8 = 1 << 1;
pub const PERMISSION_EXECUTE: u8 = 1 << 2;

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permissions {
    pub mask: u8,
}

impl Permissions {
    pub fn all() -> Self {
        Permissions {
            mask: PERMISSION_INITIATE | PERMISSION_VOTE | PERMISSION_EXECUTE,
        }
    }

    pub fn vote_only() -> Self {
        Permissions {
            mask: PERMISSION_VOTE,
        }
    }

    pub fn has(&self, permission: u8) -> bool {
        self.mask & permission == permission
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub key: Pubkey,
    pub permissions: Permissions,
}

/// Anchor account view: an 8-byte discriminator followed by the borsh-encoded
/// state. Decoding tolerates trailing bytes since accounts may carry reserved
/// padding beyond the live fields.
pub trait ProgramAccount: BorshDeserialize {
    const DISCRIMINATOR: [u8; 8];

    fn from_account_data(data: &[u8]) -> io::Result<Self> {
        if data.len() < 8 || data[..8] != Self::DISCRIMINATOR {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "account discriminator mismatch",
            ));
        }
        Self::deserialize(&mut &data[8..])
    }
}

#[derive(BorshDeserialize, Debug)]
pub struct ProgramConfig {
    pub authority: Pubkey,
    pub multisig_creation_fee: u64,
    pub treasury: Pubkey,
}

impl ProgramAccount for ProgramConfig {
    const DISCRIMINATOR: [u8; 8] = [196, 210, 90, 231, 144, 149, 140, 63];
}

#[derive(BorshDeserialize, Debug)]
pub struct Multisig {
    pub create_key: Pubkey,
    pub config_authority: Pubkey,
    pub threshold: u16,
    pub time_lock: u32,
    pub transaction_index: u64,
    pub stale_transaction_index: u64,
    pub rent_collector: Option<Pubkey>,
    pub bump: u8,
    pub members: Vec<Member>,
}

impl ProgramAccount for Multisig {
    const DISCRIMINATOR: [u8; 8] = [224, 116, 121, 186, 68, 161, 79, 236];
}

impl Multisig {
    pub fn is_member(&self, key: &Pubkey) -> bool {
        self.members.iter().any(|member| member.key == *key)
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum ProposalStatus {
    Draft { timestamp: i64 },
    Active { timestamp: i64 },
    Rejected { timestamp: i64 },
    Approved { timestamp: i64 },
    Executing,
    Executed { timestamp: i64 },
    Cancelled { timestamp: i64 },
}

#[derive(BorshDeserialize, Debug)]
pub struct Proposal {
    pub multisig: Pubkey,
    pub transaction_index: u64,
    pub status: ProposalStatus,
    pub bump: u8,
    pub approved: Vec<Pubkey>,
    pub rejected: Vec<Pubkey>,
    pub cancelled: Vec<Pubkey>,
}

impl ProgramAccount for Proposal {
    const DISCRIMINATOR: [u8; 8] = [26, 94, 189, 187, 116, 136, 53, 33];
}

#[derive(BorshDeserialize, Debug)]
pub struct VaultTransaction {
    pub multisig: Pubkey,
    pub creator: Pubkey,
    pub index: u64,
    pub bump: u8,
    pub vault_index: u8,
    pub vault_bump: u8,
    pub ephemeral_signer_bumps: Vec<u8>,
    pub message: VaultTransactionMessage,
}

impl ProgramAccount for VaultTransaction {
    const DISCRIMINATOR: [u8; 8] = [168, 250, 162, 100, 81, 14, 162, 207];
}

/// The transaction message as the program stores it, with standard borsh
/// length prefixes (the wire form submitted at creation time uses small-vec
/// prefixes instead, see `message.rs`).
#[derive(BorshDeserialize, Debug, Default)]
pub struct VaultTransactionMessage {
    pub num_signers: u8,
    pub num_writable_signers: u8,
    pub num_writable_non_signers: u8,
    pub account_keys: Vec<Pubkey>,
    pub instructions: Vec<MultisigCompiledInstruction>,
    pub address_table_lookups: Vec<MultisigMessageAddressTableLookup>,
}

impl VaultTransactionMessage {
    pub fn is_signer_index(&self, index: usize) -> bool {
        index < self.num_signers as usize
    }

    pub fn is_static_writable_index(&self, index: usize) -> bool {
        if index >= self.account_keys.len() {
            return false;
        }
        if index < self.num_writable_signers as usize {
            return true;
        }
        let num_signers = self.num_signers as usize;
        if index >= num_signers {
            return index - num_signers < self.num_writable_non_signers as usize;
        }
        false
    }
}

#[derive(BorshDeserialize, Debug)]
pub struct MultisigCompiledInstruction {
    pub program_id_index: u8,
    pub account_indexes: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(BorshDeserialize, Debug)]
pub struct MultisigMessageAddressTableLookup {
    pub account_key: Pubkey,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_masks() {
        let all = Permissions::all();
        assert!(all.has(PERMISSION_INITIATE));
        assert!(all.has(PERMISSION_VOTE));
        assert!(all.has(PERMISSION_EXECUTE));

        let voter = Permissions::vote_only();
        assert!(voter.has(PERMISSION_VOTE));
        assert!(!voter.has(PERMISSION_INITIATE));
        assert!(!voter.has(PERMISSION_EXECUTE));
    }

    #[test]
    fn decodes_approved_proposal() {
        let multisig = Pubkey::new_unique();
        let first = Pubkey::new_unique();
        let second = Pubkey::new_unique();

        let mut data = Proposal::DISCRIMINATOR.to_vec();
        data.extend_from_slice(multisig.as_ref());
        data.extend_from_slice(&1u64.to_le_bytes());
        data.push(3); // Approved
        data.extend_from_slice(&1_700_000_000i64.to_le_bytes());
        data.push(254);
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(first.as_ref());
        data.extend_from_slice(second.as_ref());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());

        let proposal = Proposal::from_account_data(&data).unwrap();
        assert_eq!(proposal.multisig, multisig);
        assert_eq!(proposal.transaction_index, 1);
        assert!(matches!(proposal.status, ProposalStatus::Approved { .. }));
        assert_eq!(proposal.approved, vec![first, second]);
        assert!(proposal.rejected.is_empty());
    }

    #[test]
    fn tolerates_trailing_reserved_bytes() {
        let mut data = ProgramConfig::DISCRIMINATOR.to_vec();
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.extend_from_slice(&[0u8; 64]);

        assert!(ProgramConfig::from_account_data(&data).is_ok());
    }

    #[test]
    fn rejects_foreign_discriminator() {
        let mut data = Multisig::DISCRIMINATOR.to_vec();
        data.extend_from_slice(&[0u8; 128]);
        assert!(Proposal::from_account_data(&data).is_err());
        assert!(Proposal::from_account_data(&[1, 2, 3]).is_err());
    }

    #[test]
    fn static_writable_classification() {
        let message = VaultTransactionMessage {
            num_signers: 1,
            num_writable_signers: 1,
            num_writable_non_signers: 1,
            account_keys: vec![
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                Pubkey::new_unique(),
            ],
            instructions: vec![],
            address_table_lookups: vec![],
        };
        assert!(message.is_signer_index(0));
        assert!(!message.is_signer_index(1));
        assert!(message.is_static_writable_index(0));
        assert!(message.is_static_writable_index(1));
        assert!(!message.is_static_writable_index(2));
        assert!(!message.is_static_writable_index(3));
    }
}
