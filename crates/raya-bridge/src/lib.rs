//! Raya Bridge - value marshaling between reflected host values and script values
//!
//! Host programs describe their data with [`Type`] descriptors and hold it in
//! typed [`Value`]s. The bridge moves those values into and out of the script
//! engine's value model in two ways:
//!
//! - **Deep conversion** copies a value out to plain script data
//!   ([`Bridge::native_to_script`]) and decodes script data back into a fresh
//!   host value of a caller-supplied type ([`Bridge::script_to_native`]).
//! - **Proxying** hands the script a live handle ([`Bridge::wrap`]) that
//!   indexes, mutates, and calls methods on the original host value, and
//!   resolves handles back to the value they are bound to
//!   ([`Bridge::unwrap`]).
//!
//! Records are mapped to tables through per-(type, tag) [`StructCodec`]s, and
//! method dispatch goes through per-type [`MethodSet`]s. Both are built once
//! and cached process-wide.
//!
//! # Example
//!
//! ```ignore
//! use raya_bridge::{Bridge, FieldDesc, MethodDesc, RecordType, Type, TypeKind, Value};
//!
//! let person = Type::named(
//!     "Person",
//!     TypeKind::Record(RecordType::new(vec![
//!         FieldDesc::new("Name", Type::string()).tag("script", "name"),
//!     ])),
//! )
//! .method(MethodDesc::value("Greeting", vec![], vec![Type::string()], |this, _| {
//!     let name = this.field("Name")?;
//!     Ok(vec![format!("hello, {}", name).into()])
//! }))
//! .build();
//!
//! let bridge = Bridge::default();
//! let bryn = Value::record_of(&person, vec!["bryn".into()])?;
//! let handle = bridge.wrap(&bryn)?;
//! let greeting = handle.call_method("Greeting", &[])?;
//! ```

#![warn(missing_docs)]

pub mod bridge;
pub mod codec;
pub mod config;
pub mod convert;
mod deep;
pub mod error;
pub mod methodset;
pub mod proxy;
pub mod script;
pub mod types;
pub mod value;

pub use bridge::Bridge;
pub use codec::{CodecCache, FieldDescriptor, StructCodec};
pub use config::{ArrayLengthPolicy, BridgeConfig, EmptyTablePolicy};
pub use error::{BridgeError, BridgeResult};
pub use methodset::{MethodEntry, MethodSet, MethodSetCache};
pub use proxy::{HandleRef, ProxyOps};
pub use script::{ScriptFunction, ScriptValue, TableRef};
pub use types::{
    FieldDefault, FieldDesc, FloatWidth, FnSig, IntWidth, InterfaceType, MethodDesc, Receiver,
    RecordType, Type, TypeKind,
};
pub use value::{MapKey, Value};
