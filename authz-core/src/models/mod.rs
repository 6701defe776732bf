pub mod page;
pub mod policy;
pub mod role;
pub mod session;

pub use page::{Direction, Order, PageMeta};
pub use policy::{EntityType, PatOperation, PatReq, PolicyReq};
pub use role::{MembersPage, NewRole, Role, RolePage, RoleProvision, BUILTIN_ADMIN_ROLE};
pub use session::{decode_domain_user_id, encode_domain_user_id, AuthType, Session};
