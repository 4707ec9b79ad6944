pub mod emergency;
pub mod intent;
pub mod nearby;

pub use emergency::is_emergency;
pub use intent::classify_fast;
pub use nearby::{ is_valid_pincode, NearbyQuery, NearbyQueryDetector };

/// Compiles every keyword pattern up front so the first request does not pay for it.
pub fn warm_up() {
    lazy_static::initialize(&emergency::EMERGENCY_RE);
    lazy_static::initialize(&intent::HEALTH_INTENT_RE);
    lazy_static::initialize(&intent::RETAIL_INTENT_RE);
    nearby::warm_up();
}
