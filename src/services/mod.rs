pub mod emotion;
pub mod identity;
pub mod movies;
pub mod providers;
pub mod validation;

pub use emotion::{EmotionDetector, HttpEmotionDetector, NeutralEmotionDetector};
pub use identity::{IdentityProvider, RetryPolicy, SupabaseIdentity};
pub use movies::{MovieCatalog, Resolution, ResolutionSource};
pub use providers::{MovieProvider, RapidApiImdbProvider};
