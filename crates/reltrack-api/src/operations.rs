// The five named operations the tracker backend exposes
//
// Each operation is a fixed document plus typed variables and data. The
// selections here are the contract; changing a field means changing the
// backend too.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A named GraphQL operation with a fixed request shape
pub trait Operation {
    /// `operationName` sent on the wire
    const NAME: &'static str;
    /// The GraphQL document
    const DOCUMENT: &'static str;
    /// Queries are cacheable, mutations are not
    const READ_ONLY: bool;

    type Variables: Serialize + Send + Sync;
    type Data: DeserializeOwned + Send;
}

pub const GET_REPOSITORIES: &str = r#"query GetRepositories {
  repositories {
    id
    name
    latestRelease {
      version
      publishedAt
      seen
    }
  }
}"#;

pub const GET_REPOSITORY_DETAILS: &str = r#"query GetRepositoryDetails($name: String!) {
  repositoryDetails(name: $name) {
    name
    stars
    forks
    latestRelease {
      version
      publishedAt
      releaseNotes
    }
  }
}"#;

pub const ADD_REPOSITORY: &str = r#"mutation AddRepository($name: String!) {
  addRepository(name: $name) {
    id
    name
    latestRelease {
      version
      publishedAt
    }
  }
}"#;

pub const MARK_RELEASE_AS_SEEN: &str = r#"mutation MarkReleaseAsSeen($releaseId: Int!) {
  markReleaseAsSeen(releaseId: $releaseId)
}"#;

pub const REFRESH_REPOSITORIES: &str = r#"mutation RefreshRepositories($names: [String!]!) {
  refreshRepositories(names: $names)
}"#;

/// Release fields as the backend sends them. Which fields are present
/// depends on the selection, so everything but `version` is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNode {
    pub version: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub seen: Option<bool>,
    #[serde(default)]
    pub release_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub latest_release: Option<ReleaseNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDetailsNode {
    pub name: String,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub forks: u64,
    #[serde(default)]
    pub latest_release: Option<ReleaseNode>,
}

/// GraphQL `ID` should arrive as a string, but plenty of servers
/// send plain integers. Accept both.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// Date scalars come as ISO strings or as epoch milliseconds. Numbers are
/// kept as their decimal text so the date formatter sees one shape.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Millis(i64),
    }

    Ok(
        Option::<RawTimestamp>::deserialize(deserializer)?.map(|raw| match raw {
            RawTimestamp::Text(ts) => ts,
            RawTimestamp::Millis(ms) => ms.to_string(),
        }),
    )
}

/// Operations without arguments still send `"variables": {}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoVariables {}

#[derive(Debug, Clone, Serialize)]
pub struct NameVariables {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseIdVariables {
    pub release_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamesVariables {
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoriesData {
    pub repositories: Vec<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDetailsData {
    #[serde(default)]
    pub repository_details: Option<RepositoryDetailsNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRepositoryData {
    pub add_repository: RepositoryNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReleaseAsSeenData {
    pub mark_release_as_seen: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRepositoriesData {
    pub refresh_repositories: bool,
}

/// `GetRepositories` - every tracked repository with its latest release
pub struct ListRepositories;

impl Operation for ListRepositories {
    const NAME: &'static str = "GetRepositories";
    const DOCUMENT: &'static str = GET_REPOSITORIES;
    const READ_ONLY: bool = true;

    type Variables = NoVariables;
    type Data = RepositoriesData;
}

/// `GetRepositoryDetails` - stars, forks and release notes for one name
pub struct GetRepositoryDetails;

impl Operation for GetRepositoryDetails {
    const NAME: &'static str = "GetRepositoryDetails";
    const DOCUMENT: &'static str = GET_REPOSITORY_DETAILS;
    const READ_ONLY: bool = true;

    type Variables = NameVariables;
    type Data = RepositoryDetailsData;
}

/// `AddRepository` - start tracking `owner/repo`
pub struct AddRepository;

impl Operation for AddRepository {
    const NAME: &'static str = "AddRepository";
    const DOCUMENT: &'static str = ADD_REPOSITORY;
    const READ_ONLY: bool = false;

    type Variables = NameVariables;
    type Data = AddRepositoryData;
}

pub struct MarkReleaseAsSeen;

impl Operation for MarkReleaseAsSeen {
    const NAME: &'static str = "MarkReleaseAsSeen";
    const DOCUMENT: &'static str = MARK_RELEASE_AS_SEEN;
    const READ_ONLY: bool = false;

    type Variables = ReleaseIdVariables;
    type Data = MarkReleaseAsSeenData;
}

/// `RefreshRepositories` - ask the backend to re-pull from GitHub.
/// The interactive client never sends this; only the CLI exposes it.
pub struct RefreshRepositories;

impl Operation for RefreshRepositories {
    const NAME: &'static str = "RefreshRepositories";
    const DOCUMENT: &'static str = REFRESH_REPOSITORIES;
    const READ_ONLY: bool = false;

    type Variables = NamesVariables;
    type Data = RefreshRepositoriesData;
}
