//! Block and chain validation
//!
//! Validation is all-or-nothing: a chain is either valid from genesis to tip
//! or rejected as a whole.

use crate::core::block::Block;
use crate::core::blockchain::BlockchainError;
use crate::mining::ProofOfWork;

/// True iff `candidate` directly extends `previous`
pub fn linkage_ok(candidate: &Block, previous: &Block) -> bool {
    candidate.previous_hash == previous.hash && candidate.index == previous.index + 1
}

/// Recompute a block's hash and check it matches and meets the difficulty
pub fn proof_of_work_ok(block: &Block, pow: &ProofOfWork) -> bool {
    match block.compute_hash() {
        Ok(hash) => hash == block.hash && pow.is_satisfied_by(&hash),
        Err(_) => false,
    }
}

/// Validate a whole chain, reporting the first failure
pub fn validate_chain(chain: &[Block], pow: &ProofOfWork) -> Result<(), BlockchainError> {
    let genesis = chain
        .first()
        .ok_or_else(|| BlockchainError::InvalidChain("chain is empty".to_string()))?;

    if !genesis.is_genesis() {
        return Err(BlockchainError::InvalidChain(
            "first block is not the genesis block".to_string(),
        ));
    }

    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        if !linkage_ok(current, previous) {
            return Err(BlockchainError::InvalidChain(format!(
                "block {} does not link to block {}",
                current.index, previous.index
            )));
        }

        if !proof_of_work_ok(current, pow) {
            return Err(BlockchainError::InvalidChain(format!(
                "block {} has an invalid proof of work",
                current.index
            )));
        }
    }

    Ok(())
}

/// Whether `chain` is a valid chain under `pow`
pub fn chain_valid(chain: &[Block], pow: &ProofOfWork) -> bool {
    validate_chain(chain, pow).is_ok()
}
