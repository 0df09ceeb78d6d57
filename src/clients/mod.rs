//! External collaborators, specified at their interface boundary: the
//! marketplace listing source and the address-normalization service.

pub mod address_enrichment;
pub mod listing_source;

pub use address_enrichment::{
    AddressEnrichmentClient, DadataClient, EnrichmentError, MockEnrichmentClient,
    NormalizedAddress,
};
pub use listing_source::{
    AvitoSourceClient, ListingSourceClient, MockSourceClient, ScrapedListing, SourceError,
};
