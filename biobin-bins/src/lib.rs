//! Rare-variant bin construction.
//!
//! Every rare locus lands in the bins of the pathways its genes belong to, in
//! the bin of a gene that belongs to no pathway, or in a fixed-width
//! intergenic window when no gene contains it. Pathway bins that grow past
//! the traverse threshold are split back into gene bins and bins below the
//! minimum size are dropped.
pub mod bin;
pub mod manager;

// re-exports
pub use self::bin::{Bin, BinKind, BinTotals};
pub use self::manager::{BinContext, BinManager};
