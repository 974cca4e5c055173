//! Route metadata: which views need a session and which are for guests only.

pub mod table;

pub use table::{default_routes, RouteMatch, RouteMeta, RouteRecord, RouteTable};
