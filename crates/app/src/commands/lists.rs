use std::future::Future;

use dmview_api::{
    ApiResult, ConversationId, ConversationOrder, ConversationTypes, NameOrder, Page, UserId,
};
use dmview_scroll::PagedList;
use dmview_storage::AppStore;
use snafu::ResultExt;

use super::{Context, render};
use crate::error::{ApiSnafu, CliResult};

/// Pulls numbered pages until the server runs dry or `max_pages` were read.
///
/// Users riding along with each page are merged into the store as they arrive.
pub async fn collect_pages<T, F, Fut>(
    store: &AppStore,
    max_pages: u32,
    mut fetch: F,
) -> CliResult<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let mut list = PagedList::new();
    while let Some(request) = list.next_page() {
        if request.page > max_pages {
            list.fail(request);
            break;
        }
        let page = match fetch(request.page).await {
            Ok(page) => page,
            Err(error) => {
                list.fail(request);
                return Err(error).context(ApiSnafu {
                    stage: "fetch-list-page",
                });
            }
        };
        tracing::debug!(page = request.page, results = page.results.len(), "fetched list page");
        store.merge_users(&page.users);
        list.apply(request, page.results);
    }
    Ok(list.into_items())
}

pub async fn conversations(
    context: &Context,
    order: ConversationOrder,
    types: ConversationTypes,
    with_user: Option<String>,
    pages: u32,
) -> CliResult<Vec<String>> {
    let client = &context.client;
    let conversations = match with_user.map(UserId::from) {
        Some(user) => {
            collect_pages(&context.store, pages, |page| {
                client.conversations_with_user(&user, page)
            })
            .await?
        }
        None => {
            collect_pages(&context.store, pages, |page| {
                client.conversations(order, types, page)
            })
            .await?
        }
    };
    context.store.merge_conversations(&conversations);
    Ok(conversations.iter().map(render::conversation_line).collect())
}

pub async fn conversation(context: &Context, id: ConversationId) -> CliResult<Vec<String>> {
    let conversation = context
        .client
        .conversation(&id)
        .await
        .context(ApiSnafu {
            stage: "fetch-conversation",
        })?;
    context
        .store
        .merge_conversations(std::slice::from_ref(&conversation));
    Ok(render::conversation_detail(&conversation))
}

pub async fn names(
    context: &Context,
    conversation: ConversationId,
    order: NameOrder,
    pages: u32,
) -> CliResult<Vec<String>> {
    let client = &context.client;
    let updates = collect_pages(&context.store, pages, |page| {
        client.conversation_names(&conversation, order, page)
    })
    .await?;
    Ok(updates
        .iter()
        .map(|update| render::name_update_line(&context.store, update))
        .collect())
}

pub async fn participants(
    context: &Context,
    conversation: Option<ConversationId>,
    pages: u32,
) -> CliResult<Vec<String>> {
    let client = &context.client;
    match conversation {
        Some(conversation) => {
            let participants = collect_pages(&context.store, pages, |page| {
                client.participants(&conversation, page)
            })
            .await?;
            Ok(participants.iter().map(render::participant_line).collect())
        }
        None => {
            let users = collect_pages(&context.store, pages, |page| client.users(page)).await?;
            let summaries = users
                .iter()
                .map(|user| user.summary.clone())
                .collect::<Vec<_>>();
            context.store.merge_users(&summaries);
            Ok(summaries.iter().map(render::user_line).collect())
        }
    }
}

pub async fn user(
    context: &Context,
    id: UserId,
    with_conversations: bool,
) -> CliResult<Vec<String>> {
    let user = context.client.user(&id).await.context(ApiSnafu {
        stage: "fetch-user",
    })?;
    context
        .store
        .merge_users(std::slice::from_ref(&user.summary));
    let mut lines = render::user_detail(&user);

    if with_conversations {
        let client = &context.client;
        let conversations = collect_pages(&context.store, 1, |page| {
            client.conversations_with_user(&id, page)
        })
        .await?;
        context.store.merge_conversations(&conversations);
        lines.push(String::new());
        lines.extend(conversations.iter().map(render::conversation_line));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use dmview_api::ApiError;
    use pretty_assertions::assert_eq;

    use super::*;

    fn page(results: Vec<u32>) -> ApiResult<Page<u32>> {
        Ok(Page {
            results,
            users: Vec::new(),
        })
    }

    #[tokio::test]
    async fn stops_at_the_first_empty_page() {
        let store = AppStore::default();
        let mut requested = Vec::new();
        let items = collect_pages(&store, 10, |number| {
            requested.push(number);
            let results = if number < 3 { vec![number; 2] } else { Vec::new() };
            std::future::ready(page(results))
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 1, 2, 2]);
        assert_eq!(requested, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn respects_the_page_limit() {
        let store = AppStore::default();
        let mut requested = Vec::new();
        let items = collect_pages(&store, 2, |number| {
            requested.push(number);
            std::future::ready(page(vec![number]))
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2]);
        assert_eq!(requested, vec![1, 2]);
    }

    #[tokio::test]
    async fn surfaces_fetch_errors() {
        let store = AppStore::default();
        let result = collect_pages(&store, 5, |_| {
            std::future::ready(Err::<Page<u32>, _>(ApiError::Status {
                stage: "test",
                endpoint: "/api/users".to_string(),
                status: 500,
                body: String::new(),
            }))
        })
        .await;

        assert!(matches!(
            result,
            Err(crate::error::CliError::Api {
                source: ApiError::Status { status: 500, .. },
                ..
            })
        ));
    }
}
