//! Recommended imports grouped by abstraction level.
//!
//! `dx` covers what application code needs to declare types and call the
//! services. `advanced` exposes descriptors and the persistence seam for
//! custom backends and mappers.

pub mod dx {
    //! Everyday surface: declare shapes, register them, call CRUD.
    pub use crate::{
        CrudServices, CrudType, Entity, EntityConstructor, EntityMethod, FieldAccess, FieldValues,
        GlobalConfig, InMemoryDatabase, MappingProfile, Outcome, PerTypeConfig, ServiceSetup,
        Status, Value, Visibility, impl_shape,
    };
}

pub mod advanced {
    //! Building blocks for other persistence backends and mappers.
    pub use crate::context::{EntityState, PersistenceContext, Query, SingleRow};
    pub use crate::decode::{
        EntityDescriptor, KeyComponent, KeyFieldBinding, MetadataCache, TransferDescriptor,
        copy_keys_back, extract_keys_in_order,
    };
    pub use crate::mapping::{FieldPair, Mapper, MappingConfig};
    pub use crate::shape::{FieldInfo, Shape};
}
