//! Host type descriptors
//!
//! The host object model is described by a closed set of kinds so every
//! conversion can dispatch exhaustively:
//!
//! | Kind        | Example            | Script form           |
//! |-------------|--------------------|-----------------------|
//! | bool        | `bool`             | boolean               |
//! | int / uint  | `int32`, `uint64`  | number                |
//! | float       | `float64`          | number                |
//! | string      | `string`           | string                |
//! | slice/array | `[]string`, `[2]T` | table or handle       |
//! | map         | `map[string]any`   | table or handle       |
//! | record      | `struct { ... }`   | table or handle       |
//! | func        | `func(int) string` | function              |
//! | pointer     | `*T`               | as the pointee        |
//! | interface   | `any`              | as the dynamic value  |
//! | complex     | `complex128`       | unsupported           |
//! | chan        | `chan T`           | unsupported           |

mod func;
mod record;
mod ty;

pub use func::{FnSig, HostFnBody, MethodBody, MethodDesc, Receiver};
pub use record::{FieldDefault, FieldDesc, RecordType};
pub use ty::{FloatWidth, IntWidth, InterfaceType, Type, TypeBuilder, TypeInfo, TypeKind};
