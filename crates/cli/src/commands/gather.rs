use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::WrapErr;
use gleaner_api::{
    CitationResults, Citations, CodeSearch, Registry, RegistryEndpoint, Repo, SearchResults,
};
use gleaner_cache::{
    store_path, write_atomic_string, CacheMode, MemoOptions, MemoStore, SnapshotStore,
};
use gleaner_client::RequestClient;
use gleaner_config::Settings;
use gleaner_core::text::count;
use gleaner_core::{successes, Error, IsEmpty};
use gleaner_runner::{query, query_multi, Task, DEFAULT_CONCURRENCY};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Search criteria accepted by the grants registry.
#[derive(Debug, Serialize)]
struct ProjectCriteria {
    opportunity_numbers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PublicationCriteria {
    core_project_nums: Vec<String>,
}

/// Raw project record, with fallbacks for every field the service may omit.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProjectRecord {
    project_num: Option<String>,
    core_project_num: Option<String>,
    project_title: Option<String>,
    opportunity_number: Option<String>,
    award_amount: Option<u64>,
    is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PublicationRecord {
    coreproject: Option<String>,
    pmid: Option<u64>,
    applid: Option<u64>,
}

/// Transformed project row written to the output directory.
#[derive(Debug, Serialize)]
struct Project {
    id: String,
    core_project: String,
    name: String,
    opportunity: String,
    award_amount: u64,
    is_active: bool,
}

#[derive(Debug, Serialize)]
struct CoreProject {
    id: String,
    name: String,
    projects: Vec<String>,
    award_amount: u64,
    publications: usize,
    repos: usize,
}

/// One search hit tied back to the core project whose tag matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RepoHit {
    repo: Repo,
    core_project: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RepoDetail {
    #[serde(flatten)]
    repo: Repo,
    core_project: String,
    languages: IndexMap<String, u64>,
    contributors: usize,
}

impl IsEmpty for RepoDetail {
    fn is_empty_value(&self) -> bool {
        self.repo.full_name.is_empty()
    }
}

pub async fn run(opportunities_file: Option<PathBuf>) -> eyre::Result<()> {
    let settings = Settings::from_env();
    let mode = CacheMode::from_env();
    tracing::info!(cache = %mode, raw = %settings.raw_dir.display(), "starting gather");

    std::fs::create_dir_all(&settings.raw_dir).wrap_err("failed to create raw directory")?;
    std::fs::create_dir_all(&settings.output_dir)
        .wrap_err("failed to create output directory")?;

    // one store of each kind for the whole run, passed down by reference
    let memo = MemoStore::open(store_path(&settings.raw_dir), mode)?;
    let snapshots = SnapshotStore::new(&settings.raw_dir, mode);
    let client = RequestClient::new().with_retries(settings.retries);
    let registry = Registry::new(client.clone());
    let citations = Citations::new(client.clone());
    let code_search = Arc::new(CodeSearch::new(client.clone(), settings.code_token.clone()));

    divider("Projects");

    let opportunity_numbers = load_opportunities(
        opportunities_file
            .unwrap_or_else(|| settings.raw_dir.join("opportunities.json"))
            .as_path(),
    )?;
    tracing::info!(
        "searching projects for {} opportunities",
        count(opportunity_numbers.len())
    );

    let criteria = ProjectCriteria {
        opportunity_numbers,
    };
    let project_results: SearchResults<ProjectRecord> =
        query(&snapshots, Some("registry-projects"), |_handle| {
            registry.search(RegistryEndpoint::Projects, &criteria)
        })
        .await?;

    let (projects, mut core_projects) = transform_projects(project_results.results);
    let core_ids: Vec<String> = core_projects.iter().map(|c| c.id.clone()).collect();
    tracing::info!(
        "{} projects across {} core projects",
        count(projects.len()),
        count(core_ids.len())
    );

    divider("Publications");

    let criteria = PublicationCriteria {
        core_project_nums: core_ids.clone(),
    };
    let publication_results: SearchResults<PublicationRecord> =
        query(&snapshots, Some("registry-publications"), |_handle| {
            registry.search(RegistryEndpoint::Publications, &criteria)
        })
        .await?;
    let publications = publication_results.results;
    tracing::info!("{} publications", count(publications.len()));

    divider("Citations");

    let pmids: Vec<u64> = publications.iter().filter_map(|p| p.pmid).collect();
    let citation_results: CitationResults =
        query(&snapshots, Some("citations"), |_handle| {
            citations.lookup(&pmids)
        })
        .await?;
    tracing::info!("{} citation records", count(citation_results.data.len()));

    divider("Repos");

    // phase one: search for repos tagged with each core project number
    let search_tasks: Vec<Task<Vec<RepoHit>>> = core_ids
        .iter()
        .map(|core| {
            let code_search = Arc::clone(&code_search);
            let core = core.clone();
            Task::new(move |handle| async move {
                handle.label(core.clone());
                let repos = code_search.search_repos(&core).await?;
                Ok(repos
                    .into_iter()
                    .map(|repo| RepoHit {
                        repo,
                        core_project: core.clone(),
                    })
                    .collect())
            })
        })
        .collect();
    let search_outcomes = query_multi(
        &snapshots,
        search_tasks,
        Some("code-repos"),
        DEFAULT_CONCURRENCY,
    )
    .await?;

    let mut seen = HashSet::new();
    let hits: Vec<RepoHit> = successes(search_outcomes)
        .into_iter()
        .flatten()
        .filter(|hit| seen.insert(hit.repo.id))
        .collect();
    tracing::info!("fetching details for {} repos", count(hits.len()));

    // phase two: per-repo details, memoized so reruns skip completed fetches
    let detail_tasks: Vec<Task<RepoDetail>> = hits
        .into_iter()
        .map(|hit| {
            let code_search = Arc::clone(&code_search);
            let memo = memo.clone();
            Task::new(move |handle| async move {
                let full_name = hit.repo.full_name.clone();
                handle.label(full_name.clone());
                let (owner, name) = full_name.split_once('/').ok_or_else(|| {
                    Error::configuration(format!("malformed repo name '{full_name}'"))
                })?;

                let repo: Repo = memo
                    .memoize("repo-detail", &full_name, &MemoOptions::default(), || {
                        code_search.repo(owner, name)
                    })
                    .await?;
                handle.progress(0.33);

                let languages: IndexMap<String, u64> = memo
                    .memoize("repo-languages", &full_name, &MemoOptions::default(), || {
                        code_search.languages(owner, name)
                    })
                    .await?;
                handle.progress(0.66);

                let contributors = code_search.contributors(owner, name).await?.len();
                handle.progress(1.0);

                Ok(RepoDetail {
                    repo,
                    core_project: hit.core_project,
                    languages,
                    contributors,
                })
            })
        })
        .collect();
    let detail_outcomes = query_multi(
        &snapshots,
        detail_tasks,
        Some("code-repo-details"),
        DEFAULT_CONCURRENCY,
    )
    .await?;
    let repos = successes(detail_outcomes);

    divider("Saving");

    for core in &mut core_projects {
        core.publications = publications
            .iter()
            .filter(|p| p.coreproject.as_deref() == Some(core.id.as_str()))
            .count();
        core.repos = repos
            .iter()
            .filter(|r| r.core_project == core.id)
            .count();
    }

    save_output(&settings.output_dir, "projects.json", &projects)?;
    save_output(&settings.output_dir, "core-projects.json", &core_projects)?;
    save_output(&settings.output_dir, "publications.json", &publications)?;
    save_output(&settings.output_dir, "citations.json", &citation_results)?;
    save_output(&settings.output_dir, "repos.json", &repos)?;

    memo.flush()?;
    tracing::info!("gather complete");
    Ok(())
}

fn divider(title: &str) {
    tracing::info!("------------------------------------------------------------");
    tracing::info!("{title}");
    tracing::info!("------------------------------------------------------------");
}

/// Load the seed list of funding-opportunity numbers.
fn load_opportunities(path: &Path) -> eyre::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("couldn't load opportunities from {}", path.display()))?;
    let numbers: Vec<String> = serde_json::from_str(&content)
        .wrap_err_with(|| format!("couldn't parse opportunities in {}", path.display()))?;
    if numbers.is_empty() {
        eyre::bail!("no opportunity numbers in {}", path.display());
    }
    Ok(numbers)
}

/// Transform raw project records into output rows plus aggregated core
/// projects, with fallbacks for every optional field.
fn transform_projects(records: Vec<ProjectRecord>) -> (Vec<Project>, Vec<CoreProject>) {
    let mut seen = HashSet::new();
    let projects: Vec<Project> = records
        .into_iter()
        .map(|record| Project {
            id: record.project_num.unwrap_or_default(),
            core_project: record.core_project_num.unwrap_or_default(),
            name: record.project_title.unwrap_or_default(),
            opportunity: record.opportunity_number.unwrap_or_default(),
            award_amount: record.award_amount.unwrap_or_default(),
            is_active: record.is_active.unwrap_or_default(),
        })
        .filter(|project| seen.insert(project.id.clone()))
        .collect();

    let mut core_projects: Vec<CoreProject> = Vec::new();
    for project in &projects {
        if project.core_project.is_empty() {
            continue;
        }
        match core_projects
            .iter_mut()
            .find(|core| core.id == project.core_project)
        {
            Some(core) => {
                core.projects.push(project.id.clone());
                core.award_amount += project.award_amount;
            }
            None => core_projects.push(CoreProject {
                id: project.core_project.clone(),
                name: project.name.clone(),
                projects: vec![project.id.clone()],
                award_amount: project.award_amount,
                publications: 0,
                repos: 0,
            }),
        }
    }

    (projects, core_projects)
}

fn save_output<T: Serialize>(dir: &Path, name: &str, value: &T) -> eyre::Result<()> {
    let content = serde_json::to_string_pretty(value).wrap_err("failed to serialize output")?;
    write_atomic_string(&dir.join(name), &content)?;
    tracing::info!(name, "saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(num: &str, core: &str, amount: u64) -> ProjectRecord {
        ProjectRecord {
            project_num: Some(num.to_string()),
            core_project_num: Some(core.to_string()),
            project_title: Some(format!("title {num}")),
            opportunity_number: Some("RFA-1".to_string()),
            award_amount: Some(amount),
            is_active: Some(true),
        }
    }

    #[test]
    fn aggregates_core_projects() {
        let (projects, cores) = transform_projects(vec![
            record("U01-1-01", "U01-1", 100),
            record("U01-1-02", "U01-1", 50),
            record("R01-9-01", "R01-9", 10),
        ]);

        assert_eq!(projects.len(), 3);
        assert_eq!(cores.len(), 2);
        let first = &cores[0];
        assert_eq!(first.id, "U01-1");
        assert_eq!(first.award_amount, 150);
        assert_eq!(first.projects.len(), 2);
    }

    #[test]
    fn dedupes_projects_by_id() {
        let (projects, _) =
            transform_projects(vec![record("P1", "C1", 5), record("P1", "C1", 5)]);
        assert_eq!(projects.len(), 1);
    }

    #[test]
    fn missing_fields_fall_back() {
        let (projects, cores) = transform_projects(vec![ProjectRecord {
            project_num: None,
            core_project_num: None,
            project_title: None,
            opportunity_number: None,
            award_amount: None,
            is_active: None,
        }]);
        assert_eq!(projects[0].id, "");
        assert!(cores.is_empty());
    }
}
