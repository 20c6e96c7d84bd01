//! Translation between application values and native column values.
//!
//! A [`GridTypeDescriptor`] converts one logical value to one native
//! [`Value`](tuplegrid_codec::Value) and back. [`BasicGridType`] pairs a
//! binder and an extractor built on a descriptor; [`ComponentGridType`]
//! spreads a multi-part value over several columns. The
//! [`TypeTranslator`] picks the grid type for each [`LogicalType`],
//! letting the dialect override the defaults.
//!
//! Every conversion is lossless or fails with
//! [`GridError::Translation`](crate::GridError::Translation).

mod descriptor;
mod grid_type;
mod translator;
mod value;

pub use descriptor::{
    GridTypeDescriptor, IntegerDescriptor, PassThroughDescriptor, PromotingDescriptor,
    SharedDescriptor, TimeUnit, UnitConvertingDescriptor,
};
pub use grid_type::{
    BasicGridBinder, BasicGridExtractor, BasicGridType, ComponentGridType, GridType,
    GridValueBinder, GridValueExtractor, SharedGridType,
};
pub use translator::{default_descriptor, default_grid_type, TypeTranslator};
pub use value::{LogicalType, TypedValue};

pub use bigdecimal::BigDecimal;
pub use num_bigint::BigInt;
pub use url::Url;
