mod client;
mod instructions;
mod message;
mod pda;
mod state;

use std::env;
use std::error::Error;

use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction;
use tracing::info;

use crate::client::SquadsClient;
use crate::instructions::{
    MultisigCreateArgsV2, ProposalCreateArgs, ProposalVoteArgs, VaultTransactionCreateArgs,
    SQUADS_PROGRAM_ID,
};
use crate::message::TransactionMessage;
use crate::state::{
    Member, Multisig, Permissions, ProgramConfig, Proposal, ProposalStatus, VaultTransaction,
    PERMISSION_VOTE,
};

const VAULT_INDEX: u8 = 0;
const TRANSACTION_INDEX: u64 = 1;
const TRANSFER_LAMPORTS: u64 = 3 * LAMPORTS_PER_SOL;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().init();
    dotenvy::dotenv().ok();

    let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| "http://localhost:8899".to_string());
    info!(program = %SQUADS_PROGRAM_ID, rpc = %rpc_url, "Starting multisig workflow");

    let client = SquadsClient::new(&rpc_url);

    let create_key = Keypair::new();
    let creator = Keypair::new();
    let second_member = Keypair::new();

    let (multisig_pda, _) = pda::multisig_pda(&create_key.pubkey());
    info!(multisig = %multisig_pda, "Derived multisig address");

    client
        .airdrop(&creator.pubkey(), 10 * LAMPORTS_PER_SOL)
        .await?;
    client
        .airdrop(&second_member.pubkey(), 10 * LAMPORTS_PER_SOL)
        .await?;

    let members = vec![
        Member {
            key: creator.pubkey(),
            permissions: Permissions::all(),
        },
        Member {
            key: second_member.pubkey(),
            permissions: Permissions::vote_only(),
        },
    ];

    create_multisig(&client, &multisig_pda, &create_key, &creator, members).await?;
    propose_transfer(&client, &multisig_pda, &creator, &second_member).await?;
    approve_proposal(&client, &multisig_pda, &creator, &second_member).await?;
    execute_proposal(&client, &multisig_pda, &creator).await?;

    Ok(())
}

/// Create the multisig with a threshold of two and verify the configuration
/// the program recorded.
async fn create_multisig(
    client: &SquadsClient,
    multisig_pda: &Pubkey,
    create_key: &Keypair,
    creator: &Keypair,
    members: Vec<Member>,
) -> Result<(), Box<dyn Error>> {
    let (program_config_pda, _) = pda::program_config_pda();
    info!(program_config = %program_config_pda, "Fetching program config");
    let program_config: ProgramConfig = client.account(&program_config_pda).await?;

    let member_keys: Vec<Pubkey> = members.iter().map(|member| member.key).collect();
    let ix = instructions::multisig_create_v2(
        &program_config_pda,
        &program_config.treasury,
        multisig_pda,
        &create_key.pubkey(),
        &creator.pubkey(),
        MultisigCreateArgsV2 {
            config_authority: None,
            threshold: 2,
            members,
            time_lock: 0,
            rent_collector: None,
            memo: None,
        },
    );
    let signature = client.send(&[ix], creator, &[creator, create_key]).await?;
    info!(signature = %signature, "Multisig created");

    let multisig: Multisig = client.account(multisig_pda).await?;
    let voters = multisig
        .members
        .iter()
        .filter(|member| member.permissions.has(PERMISSION_VOTE))
        .count();
    let configured = multisig.threshold == 2
        && multisig.members.len() == member_keys.len()
        && member_keys.iter().all(|key| multisig.is_member(key))
        && voters >= multisig.threshold as usize;
    if !configured {
        return Err(format!(
            "unexpected multisig configuration: threshold {}, {} members",
            multisig.threshold,
            multisig.members.len()
        )
        .into());
    }
    info!(
        threshold = multisig.threshold,
        members = multisig.members.len(),
        "Multisig configuration verified"
    );
    Ok(())
}

/// Fund the vault, store the transfer as a vault transaction, and open a
/// proposal for it (created and fee-paid by the second member).
async fn propose_transfer(
    client: &SquadsClient,
    multisig_pda: &Pubkey,
    creator: &Keypair,
    second_member: &Keypair,
) -> Result<(), Box<dyn Error>> {
    let (vault_pda, _) = pda::vault_pda(multisig_pda, VAULT_INDEX);
    client.airdrop(&vault_pda, 10 * LAMPORTS_PER_SOL).await?;

    let transfer = system_instruction::transfer(&vault_pda, &creator.pubkey(), TRANSFER_LAMPORTS);
    let transfer_message = TransactionMessage::compile(&vault_pda, &[transfer]);

    let (transaction_pda, _) = pda::transaction_pda(multisig_pda, TRANSACTION_INDEX);
    let ix = instructions::vault_transaction_create(
        multisig_pda,
        &transaction_pda,
        &creator.pubkey(),
        &creator.pubkey(),
        VaultTransactionCreateArgs {
            vault_index: VAULT_INDEX,
            ephemeral_signers: 1,
            transaction_message: transfer_message.to_bytes(),
            memo: Some("Transfer 3 SOL to creator".to_string()),
        },
    );
    let signature = client.send(&[ix], creator, &[creator]).await?;
    info!(signature = %signature, "Vault transaction created");

    let (proposal_pda, _) = pda::proposal_pda(multisig_pda, TRANSACTION_INDEX);
    let ix = instructions::proposal_create(
        multisig_pda,
        &proposal_pda,
        &second_member.pubkey(),
        &second_member.pubkey(),
        ProposalCreateArgs {
            transaction_index: TRANSACTION_INDEX,
            draft: false,
        },
    );
    let signature = client.send(&[ix], second_member, &[second_member]).await?;
    info!(signature = %signature, "Proposal created");
    Ok(())
}

/// Collect both approvals (fees paid by the creator) and verify the proposal
/// reached the executable state.
async fn approve_proposal(
    client: &SquadsClient,
    multisig_pda: &Pubkey,
    creator: &Keypair,
    second_member: &Keypair,
) -> Result<(), Box<dyn Error>> {
    let (proposal_pda, _) = pda::proposal_pda(multisig_pda, TRANSACTION_INDEX);

    let ix = instructions::proposal_approve(
        multisig_pda,
        &creator.pubkey(),
        &proposal_pda,
        ProposalVoteArgs { memo: None },
    );
    let signature = client.send(&[ix], creator, &[creator]).await?;
    info!(signature = %signature, "First approval");

    let ix = instructions::proposal_approve(
        multisig_pda,
        &second_member.pubkey(),
        &proposal_pda,
        ProposalVoteArgs { memo: None },
    );
    let signature = client
        .send(&[ix], creator, &[creator, second_member])
        .await?;
    info!(signature = %signature, "Second approval");

    let proposal: Proposal = client.account(&proposal_pda).await?;
    match proposal.status {
        ProposalStatus::Approved { .. } => {
            info!(approvals = proposal.approved.len(), "Proposal approved");
            Ok(())
        }
        status => Err(format!("proposal did not reach approved state: {status:?}").into()),
    }
}

/// Execute the approved transfer and report the balance movement.
async fn execute_proposal(
    client: &SquadsClient,
    multisig_pda: &Pubkey,
    creator: &Keypair,
) -> Result<(), Box<dyn Error>> {
    let (vault_pda, _) = pda::vault_pda(multisig_pda, VAULT_INDEX);
    let (transaction_pda, _) = pda::transaction_pda(multisig_pda, TRANSACTION_INDEX);
    let (proposal_pda, _) = pda::proposal_pda(multisig_pda, TRANSACTION_INDEX);
    info!(proposal = %proposal_pda, "Executing proposal");

    let creator_before = client.balance(&creator.pubkey()).await?;
    let vault_before = client.balance(&vault_pda).await?;
    info!(
        creator = creator_before,
        vault = vault_before,
        "Balances before execution"
    );

    let transaction: VaultTransaction = client.account(&transaction_pda).await?;
    let remaining = instructions::execute_account_metas(&transaction, &transaction_pda, &vault_pda);
    let ix = instructions::vault_transaction_execute(
        multisig_pda,
        &proposal_pda,
        &transaction_pda,
        &creator.pubkey(),
        remaining,
    );
    let signature = client.send(&[ix], creator, &[creator]).await?;
    info!(signature = %signature, "Transaction executed");

    let creator_after = client.balance(&creator.pubkey()).await?;
    let vault_after = client.balance(&vault_pda).await?;
    info!(
        creator = creator_after,
        vault = vault_after,
        "Balances after execution"
    );
    Ok(())
}
