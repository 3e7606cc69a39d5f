//! Transaction direction: is this money owed to the tenant, or by it?

use serde::{Deserialize, Serialize};

use crate::models::enums::{Direction, DirectionSource};
use crate::models::tenant::TenantIdentity;
use crate::pipeline::extraction::types::{ExtractedData, Party};

/// Resolved direction, which signal decided it, and how sure we are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionResolution {
    pub direction: Direction,
    pub source: DirectionSource,
    pub confidence: f64,
}

impl DirectionResolution {
    pub fn unknown() -> Self {
        Self {
            direction: Direction::Unknown,
            source: DirectionSource::Unknown,
            confidence: 0.0,
        }
    }

    fn matched(direction: Direction, source: DirectionSource) -> Self {
        Self {
            direction,
            source,
            confidence: 1.0,
        }
    }
}

/// Resolve the direction from the tenant's identity, then the model hint.
///
/// Signals are tried in strict priority order and the first one that
/// matches wins outright:
/// 1. VAT number of either party equals the tenant's (confidence 1.0)
/// 2. name of either party equals the tenant's legal name, display name
///    or an alias (confidence 1.0)
/// 3. the extraction's own direction hint, confidence taken verbatim
/// 4. unknown
///
/// Tenant as seller means Outbound, tenant as buyer means Inbound. A
/// shape without a buyer (receipts, expenses) can only match as seller
/// through the identity rules.
pub fn resolve_direction(data: &ExtractedData, tenant: &TenantIdentity) -> DirectionResolution {
    let seller = data.seller();
    let buyer = data.buyer();

    if let Some(direction) = side_of(tenant, seller, buyer, |t, p| t.owns_vat(p.vat_number)) {
        return DirectionResolution::matched(direction, DirectionSource::VatMatch);
    }
    if let Some(direction) = side_of(tenant, seller, buyer, |t, p| t.owns_name(p.name)) {
        return DirectionResolution::matched(direction, DirectionSource::NameMatch);
    }

    match data.direction_hint() {
        Some(hint) if hint.direction != Direction::Unknown => match hint.confidence {
            Some(confidence) => DirectionResolution {
                direction: hint.direction,
                source: DirectionSource::AiHint,
                confidence,
            },
            None => DirectionResolution::unknown(),
        },
        _ => DirectionResolution::unknown(),
    }
}

/// Which side the tenant is on according to `is_self`; seller is tried first.
fn side_of(
    tenant: &TenantIdentity,
    seller: Party<'_>,
    buyer: Party<'_>,
    is_self: impl Fn(&TenantIdentity, Party<'_>) -> bool,
) -> Option<Direction> {
    if is_self(tenant, seller) {
        Some(Direction::Outbound)
    } else if is_self(tenant, buyer) {
        Some(Direction::Inbound)
    } else {
        None
    }
}

/// VAT number of the party that is not the tenant, given a resolved
/// direction. Unknown direction has no counterparty.
pub fn resolved_counterparty_vat(data: &ExtractedData, direction: Direction) -> Option<&str> {
    let counterparty = match direction {
        Direction::Outbound => data.buyer(),
        Direction::Inbound => data.seller(),
        Direction::Unknown => return None,
    };
    counterparty.vat_number.filter(|v| !v.trim().is_empty())
}
