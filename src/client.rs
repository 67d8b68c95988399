use std::error::Error;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::state::ProgramAccount;

/// Thin wrapper around the single RPC connection. Every call is a blocking
/// round trip; a submission is only considered done once the cluster reports
/// it confirmed.
pub struct SquadsClient {
    rpc: RpcClient,
}

impl SquadsClient {
    pub fn new(rpc_url: &str) -> Self {
        SquadsClient {
            rpc: RpcClient::new_with_commitment(
                rpc_url.to_string(),
                CommitmentConfig::confirmed(),
            ),
        }
    }

    pub async fn airdrop(&self, to: &Pubkey, lamports: u64) -> Result<Signature, Box<dyn Error>> {
        let signature = self.rpc.request_airdrop(to, lamports).await?;
        while !self.rpc.confirm_transaction(&signature).await? {
            sleep(Duration::from_millis(400)).await;
        }
        debug!(to = %to, lamports, "Airdrop confirmed");
        Ok(signature)
    }

    /// Sign with a fresh blockhash, submit, and wait for confirmation.
    pub async fn send(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> Result<Signature, Box<dyn Error>> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            signers,
            blockhash,
        );
        let signature = self.rpc.send_and_confirm_transaction(&transaction).await?;
        Ok(signature)
    }

    pub async fn account<T: ProgramAccount>(&self, address: &Pubkey) -> Result<T, Box<dyn Error>> {
        let account = self.rpc.get_account(address).await?;
        Ok(T::from_account_data(&account.data)?)
    }

    pub async fn balance(&self, address: &Pubkey) -> Result<u64, Box<dyn Error>> {
        Ok(self.rpc.get_balance(address).await?)
    }
}
