use fetcher::{ApiError, RecordStore, StoreError};
use futures::future::{BoxFuture, FutureExt};
use models::Record;
use std::collections::BTreeSet;

mod pagination;
mod soql;

pub use soql::select_in;

/// Version of the REST API which requests are made against.
pub const API_VERSION: &str = "v57.0";

/// Client is a RecordStore of a remote CRM instance, accessed through its REST API.
#[derive(Clone)]
pub struct Client {
    // HTTP client to use for REST requests.
    http_client: reqwest::Client,
    // Base URL of the remote instance.
    instance_url: url::Url,
    // Bearer token of the caller, which was obtained out of band.
    access_token: String,
    // Key of the remote organization, which scopes cached schemas.
    org_id: String,
}

impl Client {
    pub fn new(instance_url: url::Url, access_token: String) -> Self {
        let org_id = instance_url.host_str().unwrap_or_default().to_string();

        Self {
            http_client: reqwest::Client::new(),
            instance_url,
            access_token,
            org_id,
        }
    }

    pub fn with_org_id(self, org_id: String) -> Self {
        Self { org_id, ..self }
    }

    /// Fetch the field names of entity type `object`.
    #[tracing::instrument(skip(self), err)]
    pub async fn describe_fields(&self, object: &str) -> Result<BTreeSet<String>, StoreError> {
        #[derive(serde::Deserialize)]
        struct Describe {
            fields: Vec<Field>,
        }
        #[derive(serde::Deserialize)]
        struct Field {
            name: String,
        }

        let path = format!("/services/data/{API_VERSION}/sobjects/{object}/describe");
        let Describe { fields } = self.get(&path, &[]).await?;

        Ok(fields.into_iter().map(|field| field.name).collect())
    }

    /// Run `soql` to completion, following every page of its results.
    #[tracing::instrument(skip(self), err)]
    pub async fn query_all(&self, soql: &str) -> Result<Vec<Record>, StoreError> {
        use futures::TryStreamExt;

        let rows: Vec<serde_json::Value> = pagination::into_rows(self.clone(), soql)
            .try_collect()
            .await?;

        Ok(rows.into_iter().filter_map(Record::from_value).collect())
    }

    /// Performs a GET request of `path` and returns a result with either the
    /// deserialized response or an error. Error responses carrying the remote
    /// error envelope are API errors, and all others are transport errors.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        raw_query: &[(&str, &str)],
    ) -> Result<T, StoreError> {
        let url = self
            .instance_url
            .join(path)
            .map_err(anyhow::Error::from)?;

        let request = self
            .http_client
            .get(url)
            .query(raw_query)
            .bearer_auth(&self.access_token)
            .build()
            .map_err(anyhow::Error::from)?;
        tracing::debug!(url = %request.url(), method = "GET", "sending request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(anyhow::Error::from)?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await.map_err(anyhow::Error::from)?)
        } else {
            let body = response.text().await.map_err(anyhow::Error::from)?;
            Err(error_response(path, status, &body))
        }
    }
}

fn error_response(path: &str, status: reqwest::StatusCode, body: &str) -> StoreError {
    match serde_json::from_str::<Vec<ApiError>>(body) {
        Ok(errors) if !errors.is_empty() => StoreError::Api(errors),
        _ => StoreError::Transport(anyhow::anyhow!("GET {path}: {status}: {body}")),
    }
}

impl RecordStore for Client {
    fn org_id(&self) -> &str {
        &self.org_id
    }

    fn describe<'a>(
        &'a self,
        object: &'a str,
    ) -> BoxFuture<'a, Result<BTreeSet<String>, StoreError>> {
        self.describe_fields(object).boxed()
    }

    fn batch_query<'a>(
        &'a self,
        object: &'a str,
        fields: &'a [String],
        id_field: &'a str,
        ids: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Record>, StoreError>> {
        async move {
            let soql = select_in(object, fields, id_field, ids);
            self.query_all(&soql).await
        }
        .boxed()
    }
}
