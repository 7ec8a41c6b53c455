use super::{Client, API_VERSION};
use fetcher::StoreError;
use futures::Stream;
use page_turner::{PageTurner, PageTurnerOutput, TurnedPage};

/// QueryRequest is the next page of a query's results: either the
/// query itself, or the locator of its following page.
pub enum QueryRequest {
    Query(String),
    Next(String),
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    records: Vec<serde_json::Value>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    next_records_url: Option<String>,
}

/// Stream every row of the results of `soql`.
pub fn into_rows(
    client: Client,
    soql: &str,
) -> impl Stream<Item = Result<serde_json::Value, StoreError>> {
    client
        .into_pages(QueryRequest::Query(soql.to_string()))
        .items()
}

#[async_trait::async_trait]
impl PageTurner<QueryRequest> for Client {
    type PageItem = serde_json::Value;
    type PageError = StoreError;

    async fn turn_page(&self, request: QueryRequest) -> PageTurnerOutput<Self, QueryRequest> {
        let query_path = format!("/services/data/{API_VERSION}/query");

        let response: QueryResponse = match &request {
            QueryRequest::Query(soql) => self.get(&query_path, &[("q", soql.as_str())]).await?,
            QueryRequest::Next(locator) => self.get(locator, &[]).await?,
        };
        let QueryResponse {
            records,
            done,
            next_records_url,
        } = response;

        match next_records_url {
            Some(locator) if !done => {
                tracing::debug!(
                    row_count = records.len(),
                    %locator,
                    "got back a partial response, progressing to the next page"
                );
                Ok(TurnedPage::next(records, QueryRequest::Next(locator)))
            }
            _ => {
                tracing::debug!(row_count = records.len(), "got back the last page");
                Ok(TurnedPage::last(records))
            }
        }
    }
}
