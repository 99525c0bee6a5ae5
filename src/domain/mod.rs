pub mod assembler;
pub mod ids;
pub mod transaction;

pub use assembler::{AssemblyContext, TransactionAssembler};
pub use ids::{IdGenerator, UuidGenerator};
pub use transaction::{
    Metadata, PaymentDetails, PaymentRequest, TransactionRecord, TransactionStatus,
    DEFAULT_CURRENCY,
};
