//! SQL used by the outbox store. The schema lives in `migrations/`.

/// Inserts the swap itself.
pub const INSERT_SWAP: &str = r"
INSERT INTO swaps (id, who, token, amount, usd, side)
VALUES ($1, $2, $3, $4, $5, $6)
";

/// Inserts the pending-delivery marker for a swap.
pub const INSERT_OUTBOX: &str = r"
INSERT INTO swap_outbox (swap_id)
VALUES ($1)
";

/// Locks up to `$1` pending rows in append order, skipping rows already
/// locked by a concurrent claim.
pub const CLAIM_BATCH: &str = r"
SELECT o.id AS outbox_id, s.id, s.who, s.token, s.amount, s.usd, s.side
FROM swap_outbox o
JOIN swaps s ON s.id = o.swap_id
ORDER BY o.id
LIMIT $1
FOR UPDATE OF o SKIP LOCKED
";

/// Records an outbox row whose swap could not be decoded.
pub const INSERT_REJECTED: &str = r"
INSERT INTO swap_outbox_rejected (outbox_id, swap_id, reason)
VALUES ($1, $2, $3)
";

/// Removes delivered or rejected rows.
pub const DELETE_CLAIMED: &str = r"
DELETE FROM swap_outbox
WHERE id = ANY($1)
";

/// Counts pending rows.
pub const COUNT_BACKLOG: &str = r"
SELECT COUNT(*) FROM swap_outbox
";
