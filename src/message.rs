use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;

/// Compiled transaction message in the wire form `vault_transaction_create`
/// expects: account and instruction lists are u8-length-prefixed and
/// instruction data is u16-length-prefixed, unlike the standard borsh vectors
/// the program uses once the message is stored on chain.
pub struct TransactionMessage {
    pub num_signers: u8,
    pub num_writable_signers: u8,
    pub num_writable_non_signers: u8,
    pub account_keys: Vec<Pubkey>,
    pub instructions: Vec<CompiledIx>,
}

pub struct CompiledIx {
    pub program_id_index: u8,
    pub account_indexes: Vec<u8>,
    pub data: Vec<u8>,
}

impl TransactionMessage {
    /// Compile `instructions` against `payer` the way the runtime would and
    /// translate the resulting header into the program's signer/writable
    /// counts. Address table lookups are not supported.
    pub fn compile(payer: &Pubkey, instructions: &[Instruction]) -> Self {
        let message = Message::new(instructions, Some(payer));
        let num_signers = message.header.num_required_signatures;
        let num_writable_signers = num_signers - message.header.num_readonly_signed_accounts;
        let num_writable_non_signers = message.account_keys.len() as u8
            - num_signers
            - message.header.num_readonly_unsigned_accounts;

        TransactionMessage {
            num_signers,
            num_writable_signers,
            num_writable_non_signers,
            account_keys: message.account_keys,
            instructions: message
                .instructions
                .into_iter()
                .map(|ix| CompiledIx {
                    program_id_index: ix.program_id_index,
                    account_indexes: ix.accounts,
                    data: ix.data,
                })
                .collect(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![
            self.num_signers,
            self.num_writable_signers,
            self.num_writable_non_signers,
        ];
        out.push(self.account_keys.len() as u8);
        for key in &self.account_keys {
            out.extend_from_slice(key.as_ref());
        }
        out.push(self.instructions.len() as u8);
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            out.push(ix.account_indexes.len() as u8);
            out.extend_from_slice(&ix.account_indexes);
            out.extend_from_slice(&(ix.data.len() as u16).to_le_bytes());
            out.extend_from_slice(&ix.data);
        }
        // no address table lookups
        out.push(0);
        out
    }
}
