//! Centralized capability resolution.
//!
//! Every role decision about hotels, bookings and statistics is made here.
//! Services check existence first, then ask [`resolve`] what the caller may
//! do with the resource they found.

use crate::domain::{Booking, Hotel, StringUuid, UserRole};
use crate::error::AppError;

pub type PolicyResult<T> = std::result::Result<T, AppError>;

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: StringUuid,
    pub role: UserRole,
}

impl Principal {
    pub fn new(id: StringUuid, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Create,
    Read,
    Update,
    Delete,
    /// Write any status (hotel approval, booking confirmation)
    SetStatus,
    /// Move a booking to `cancelled`
    Cancel,
    EditRemarks,
    ReadStatistics,
}

impl Capability {
    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Set of capabilities granted on one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn of(capabilities: &[Capability]) -> Self {
        Self(capabilities.iter().fold(0, |acc, c| acc | c.bit()))
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// What the caller is acting on, reduced to the fields that decide access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The hotel collection (creating listings)
    HotelCatalog,
    Hotel { merchant_id: StringUuid },
    /// The booking collection (placing bookings)
    BookingCatalog,
    Booking {
        user_id: Option<StringUuid>,
        hotel_merchant_id: StringUuid,
    },
    /// Revenue statistics; `None` is the platform-wide scope.
    Statistics { merchant_id: Option<StringUuid> },
}

impl Resource {
    pub fn hotel(hotel: &Hotel) -> Self {
        Resource::Hotel {
            merchant_id: hotel.merchant_id,
        }
    }

    pub fn booking(booking: &Booking, hotel_merchant_id: StringUuid) -> Self {
        Resource::Booking {
            user_id: booking.user_id,
            hotel_merchant_id,
        }
    }
}

/// Map `(principal, resource)` to the capabilities granted.
pub fn resolve(principal: &Principal, resource: &Resource) -> CapabilitySet {
    use Capability::*;

    match (principal.role, resource) {
        (_, Resource::BookingCatalog) => CapabilitySet::of(&[Create]),

        (UserRole::Admin, Resource::HotelCatalog) => CapabilitySet::of(&[Create]),
        (UserRole::Admin, Resource::Hotel { .. }) => {
            CapabilitySet::of(&[Read, Update, Delete, SetStatus])
        }
        (UserRole::Admin, Resource::Booking { .. }) => {
            CapabilitySet::of(&[Read, Update, Delete, SetStatus, Cancel, EditRemarks])
        }
        (UserRole::Admin, Resource::Statistics { .. }) => CapabilitySet::of(&[ReadStatistics]),

        (UserRole::Merchant, Resource::HotelCatalog) => CapabilitySet::of(&[Create]),
        (UserRole::Merchant, Resource::Hotel { merchant_id }) => {
            if *merchant_id == principal.id {
                CapabilitySet::of(&[Read, Update, Delete])
            } else {
                CapabilitySet::of(&[Read])
            }
        }
        (
            UserRole::Merchant,
            Resource::Booking {
                hotel_merchant_id, ..
            },
        ) => {
            if *hotel_merchant_id == principal.id {
                CapabilitySet::of(&[Read, Update, Delete, SetStatus, Cancel, EditRemarks])
            } else {
                CapabilitySet::empty()
            }
        }
        (UserRole::Merchant, Resource::Statistics { merchant_id }) => {
            if *merchant_id == Some(principal.id) {
                CapabilitySet::of(&[ReadStatistics])
            } else {
                CapabilitySet::empty()
            }
        }

        (UserRole::User, Resource::HotelCatalog) => CapabilitySet::empty(),
        (UserRole::User, Resource::Hotel { .. }) => CapabilitySet::of(&[Read]),
        (UserRole::User, Resource::Booking { user_id, .. }) => {
            if *user_id == Some(principal.id) {
                CapabilitySet::of(&[Read, Update, Delete, Cancel])
            } else {
                CapabilitySet::empty()
            }
        }
        (UserRole::User, Resource::Statistics { .. }) => CapabilitySet::empty(),
    }
}

/// Fail with `Forbidden` unless `capability` is granted.
pub fn enforce(
    principal: &Principal,
    resource: &Resource,
    capability: Capability,
) -> PolicyResult<()> {
    if resolve(principal, resource).contains(capability) {
        return Ok(());
    }
    tracing::warn!(
        user_id = %principal.id,
        role = %principal.role,
        ?capability,
        ?resource,
        "access denied"
    );
    Err(AppError::Forbidden(
        "You do not have permission to perform this action".to_string(),
    ))
}
