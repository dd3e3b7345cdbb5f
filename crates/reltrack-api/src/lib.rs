// GraphQL gateway transport for the release tracker backend
pub mod client;
pub mod graphql;
pub mod operations;

// Re-export common types
pub use client::{GatewayClient, GatewayError, Result, DEFAULT_ENDPOINT};
pub use graphql::{GraphQlError, GraphQlRequest, GraphQlResponse};
pub use operations::{
    AddRepository, GetRepositoryDetails, ListRepositories, MarkReleaseAsSeen, NameVariables,
    NamesVariables, NoVariables, Operation, RefreshRepositories, ReleaseIdVariables, ReleaseNode,
    RepositoryDetailsNode, RepositoryNode,
};
