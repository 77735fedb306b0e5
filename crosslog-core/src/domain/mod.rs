//! Domain types for crosslog

pub mod bar;
pub mod ids;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use ids::{IdGen, OrderId};
pub use order::{
    ExecType, Execution, OrderNotification, OrderRequest, OrderSide, OrderStatus,
    ParseExecTypeError,
};
pub use position::{Position, PositionDirection};
pub use trade::{TradeNotification, TradeRecord};
