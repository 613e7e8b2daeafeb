//! Signature extraction over the [`crate::ast`] view.
//!
//! Leaf first: [`type_tag`] holds the canonical table, [`resolver`] and
//! [`array_shape`] turn type nodes into [`ResolvedType`] values, [`method`]
//! builds one [`MethodSignature`], [`class`] groups a class's methods into
//! overload groups and [`namespace`] finds the classes to visit.

pub mod array_shape;
pub mod class;
pub mod method;
pub mod namespace;
pub mod resolver;
pub mod type_tag;

pub use array_shape::{detect, ArrayShape};
pub use class::{ClassAggregator, ClassRecord, ErrorPolicy, MethodTable, SkippedMethod};
pub use method::{base_name, Argument, MethodExtractor, MethodSignature, RecordPolicy};
pub use namespace::{collect_classes, ClassIndex, CollisionPolicy, NamespaceCollector};
pub use resolver::{resolve, Dimensionality, ResolvedType};
pub use type_tag::TypeTag;
