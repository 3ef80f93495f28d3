//! flatree: compose flat parent-pointer record sets into grouped, ordered forests.
//!
//! ```
//! use flatree::domain::{compose, Node};
//!
//! let nodes = vec![
//!     Node::new(1, "menu", "Home").with_order(1),
//!     Node::new(100, "menu", "News").with_parent(1).with_order(1),
//!     Node::new(3, "menu", "About").with_order(2),
//! ];
//! let forests = compose(&nodes).unwrap();
//! let menu = &forests["menu"];
//! assert_eq!(menu[0].node.id, 1);
//! assert_eq!(menu[0].children[0].node.id, 100);
//! assert_eq!(menu[1].node.id, 3);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{compose, ComposeError, ComposeOptions, Node, TreeComposer, TreeNode};
