//! Catalog lookups over a [`CatalogSource`]
//!
//! Whole tables are read through the [`CatalogCache`]; filtered lookups and
//! searches run over the cached snapshot.

use crate::cache::{CatalogCache, CatalogTable};
use crate::error::{CatalogError, CatalogResult};
use edubridge_store::{CatalogSource, Country, Course, Pathway, University};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Optional narrowing for university search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversityFilter {
    /// Only universities in this country
    pub country_id: Option<i64>,
    /// Case-insensitive match on the type column
    pub university_type: Option<String>,
}

impl UniversityFilter {
    /// Restrict to one country
    #[must_use]
    pub fn in_country(mut self, country_id: i64) -> Self {
        self.country_id = Some(country_id);
        self
    }

    /// Restrict to one university type
    #[must_use]
    pub fn of_type(mut self, university_type: impl Into<String>) -> Self {
        self.university_type = Some(university_type.into());
        self
    }

    fn matches(&self, university: &University) -> bool {
        self.country_id.map_or(true, |id| university.country_id == id)
            && self.university_type.as_deref().map_or(true, |wanted| {
                university
                    .university_type
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(wanted))
            })
    }
}

/// Optional narrowing for course search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseFilter {
    /// Only courses at this university
    pub university_id: Option<i64>,
    /// Case-insensitive match on the degree level
    pub degree_level: Option<String>,
}

impl CourseFilter {
    /// Restrict to one university
    #[must_use]
    pub fn at_university(mut self, university_id: i64) -> Self {
        self.university_id = Some(university_id);
        self
    }

    /// Restrict to one degree level
    #[must_use]
    pub fn at_level(mut self, degree_level: impl Into<String>) -> Self {
        self.degree_level = Some(degree_level.into());
        self
    }

    fn matches(&self, course: &Course) -> bool {
        self.university_id.map_or(true, |id| course.university_id == id)
            && self.degree_level.as_deref().map_or(true, |wanted| {
                course
                    .degree_level
                    .as_deref()
                    .is_some_and(|l| l.eq_ignore_ascii_case(wanted))
            })
    }
}

/// Row counts of the catalog tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    /// Cached country rows
    pub countries: usize,
    /// Cached university rows
    pub universities: usize,
    /// Cached course rows
    pub courses: usize,
    /// Cached pathway rows
    pub pathways: usize,
}

/// Substring match against an already lowercased needle
fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

/// Cached catalog lookups
#[derive(Debug)]
pub struct CatalogService<S> {
    source: Arc<S>,
    cache: CatalogCache,
}

impl<S> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            cache: self.cache.clone(),
        }
    }
}

impl<S: CatalogSource> CatalogService<S> {
    /// Service reading `source` through `cache`
    pub fn new(source: Arc<S>, cache: CatalogCache) -> Self {
        Self { source, cache }
    }

    /// The cache, for invalidation and stats
    #[must_use]
    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    /// Drop one cached table so the next read reloads it
    pub async fn invalidate(&self, table: CatalogTable) {
        tracing::info!(table = table.table_name(), "catalog table invalidated");
        self.cache.invalidate(table).await;
    }

    /// Drop every cached table
    pub fn invalidate_all(&self) {
        tracing::info!("catalog cache cleared");
        self.cache.invalidate_all();
    }

    // ---- countries ----

    /// All countries ordered by name
    pub async fn all_countries(&self) -> CatalogResult<Arc<Vec<Country>>> {
        self.cache
            .try_get_or_insert_with(|| self.source.countries())
            .await
    }

    /// Country by id
    pub async fn country_by_id(&self, country_id: i64) -> CatalogResult<Country> {
        self.all_countries()
            .await?
            .iter()
            .find(|c| c.country_id == country_id)
            .cloned()
            .ok_or(CatalogError::NotFound {
                entity: "country",
                id: country_id,
            })
    }

    // ---- universities ----

    /// All universities ordered by name
    pub async fn all_universities(&self) -> CatalogResult<Arc<Vec<University>>> {
        self.cache
            .try_get_or_insert_with(|| self.source.universities())
            .await
    }

    /// Universities in a country
    pub async fn universities_by_country(&self, country_id: i64) -> CatalogResult<Vec<University>> {
        self.search_universities("", &UniversityFilter::default().in_country(country_id))
            .await
    }

    /// University by id
    pub async fn university_by_id(&self, id: i64) -> CatalogResult<University> {
        self.all_universities()
            .await?
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound {
                entity: "university",
                id,
            })
    }

    /// Universities whose name, city or state contains `term`
    pub async fn search_universities(
        &self,
        term: &str,
        filter: &UniversityFilter,
    ) -> CatalogResult<Vec<University>> {
        let needle = term.trim().to_lowercase();
        let rows = self.all_universities().await?;
        Ok(rows
            .iter()
            .filter(|u| filter.matches(u))
            .filter(|u| {
                needle.is_empty()
                    || contains_ci(Some(u.university_name.as_str()), &needle)
                    || contains_ci(u.city.as_deref(), &needle)
                    || contains_ci(u.state_province.as_deref(), &needle)
            })
            .cloned()
            .collect())
    }

    // ---- courses ----

    /// All courses ordered by program name
    pub async fn all_courses(&self) -> CatalogResult<Arc<Vec<Course>>> {
        self.cache
            .try_get_or_insert_with(|| self.source.courses())
            .await
    }

    /// Courses offered by a university
    pub async fn courses_by_university(&self, university_id: i64) -> CatalogResult<Vec<Course>> {
        self.search_courses("", &CourseFilter::default().at_university(university_id))
            .await
    }

    /// Course by id
    pub async fn course_by_id(&self, id: i64) -> CatalogResult<Course> {
        self.all_courses()
            .await?
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound {
                entity: "course",
                id,
            })
    }

    /// Courses whose program name contains `term`
    pub async fn search_courses(
        &self,
        term: &str,
        filter: &CourseFilter,
    ) -> CatalogResult<Vec<Course>> {
        let needle = term.trim().to_lowercase();
        let rows = self.all_courses().await?;
        Ok(rows
            .iter()
            .filter(|c| filter.matches(c))
            .filter(|c| needle.is_empty() || contains_ci(Some(c.program_name.as_str()), &needle))
            .cloned()
            .collect())
    }

    // ---- pathways ----

    /// All pathways ordered by name
    pub async fn all_pathways(&self) -> CatalogResult<Arc<Vec<Pathway>>> {
        self.cache
            .try_get_or_insert_with(|| self.source.pathways())
            .await
    }

    /// Row counts of all four tables, loaded concurrently
    pub async fn statistics(&self) -> CatalogResult<CatalogStatistics> {
        let (countries, universities, courses, pathways) = futures::try_join!(
            self.all_countries(),
            self.all_universities(),
            self.all_courses(),
            self.all_pathways(),
        )?;
        Ok(CatalogStatistics {
            countries: countries.len(),
            universities: universities.len(),
            courses: courses.len(),
            pathways: pathways.len(),
        })
    }
}
