pub mod audit;
pub mod connector;
pub mod gateway;
pub mod mysql;
pub mod statement;

pub use connector::{Connection, ConnectionProvider};
pub use gateway::{
    ErrorClass, GatewayError, QueryGateway, RetryPolicy, classify_error, classify_server_error,
};
pub use statement::{Param, QueryOutcome, Row, Statement};
