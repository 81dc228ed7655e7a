mod card;
mod curve;
mod version;

pub use card::{Card, CardId, CardWallet, WalletStatus};
pub use curve::EllipticCurve;
pub use version::{CardCapability, FirmwareVersion};
