pub mod fgsm;
pub mod pgd;

pub use fgsm::{fgsm, fgsm_in_place, FgsmAttack, FgsmConfig};
pub use pgd::{pgd, pgd_in_place, Goal, PgdAttack, PgdConfig};
