//! The assignment engine.
//!
//! A scheme moves between empty, partially assigned, and fully assigned as
//! points are assigned and unassigned. There is no locked state: a scheme can
//! always be mutated or deleted.

use crate::error::AssignError;
use crate::report::{
    AddressPlan, AssignmentFailure, AssignmentRecord, AssignmentStatistics, AutoAssignSummary,
    OptimalSuggestion, ProjectSummary, SchemeOverview, SchemeSummary, SkippedPoint,
    TypeBreakdown, ValidationReport,
};
use chanmap_core::{
    ChannelCatalog, ChannelId, ChannelInfo, Mapping, ModuleAddressPlanner, PlanError, Point,
    PointCatalog, Scheme, SignalType,
};
use chanmap_store::{Project, Repository, Workspace};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Assignment operations over a repository and a channel catalog.
pub struct AssignmentEngine<R: Repository> {
    repo: R,
    catalog: ChannelCatalog,
}

fn find_project<'a>(ws: &'a Workspace, project_id: &str) -> Result<&'a Project, AssignError> {
    ws.project(project_id)
        .ok_or_else(|| AssignError::ProjectNotFound(project_id.to_string()))
}

fn find_project_mut<'a>(
    ws: &'a mut Workspace,
    project_id: &str,
) -> Result<&'a mut Project, AssignError> {
    ws.project_mut(project_id)
        .ok_or_else(|| AssignError::ProjectNotFound(project_id.to_string()))
}

fn scheme_not_found(project_id: &str, scheme_id: &str) -> AssignError {
    AssignError::SchemeNotFound {
        project_id: project_id.to_string(),
        scheme_id: scheme_id.to_string(),
    }
}

fn find_scheme<'a>(
    ws: &'a Workspace,
    project_id: &str,
    scheme_id: &str,
) -> Result<(&'a Project, &'a Scheme), AssignError> {
    let project = find_project(ws, project_id)?;
    let scheme = project
        .scheme(scheme_id)
        .ok_or_else(|| scheme_not_found(project_id, scheme_id))?;
    Ok((project, scheme))
}

/// Borrow a project's points and one of its schemes at the same time.
fn split_scheme_mut<'a>(
    ws: &'a mut Workspace,
    project_id: &str,
    scheme_id: &str,
) -> Result<(&'a [Point], &'a mut Scheme), AssignError> {
    let Project {
        points, schemes, ..
    } = find_project_mut(ws, project_id)?;
    let scheme = schemes
        .iter_mut()
        .find(|s| s.id == scheme_id)
        .ok_or_else(|| scheme_not_found(project_id, scheme_id))?;
    Ok((points.as_slice(), scheme))
}

#[allow(clippy::cast_precision_loss)]
fn coverage(assigned: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    assigned as f64 / total as f64
}

/// Catalog points that currently hold a mapping in the scheme.
fn live_assigned<'a>(points: &'a [Point], scheme: &Scheme) -> Vec<&'a Point> {
    let assigned = scheme.assigned_point_ids();
    points
        .iter()
        .filter(|p| assigned.contains(p.id.as_str()))
        .collect()
}

fn logged<T>(operation: &str, result: Result<T, AssignError>) -> Result<T, AssignError> {
    if let Err(err) = &result {
        match err {
            AssignError::Persistence(_) => {
                tracing::error!(operation, kind = err.kind(), error = %err, "Operation failed");
            }
            _ => tracing::warn!(operation, kind = err.kind(), error = %err, "Operation rejected"),
        }
    }
    result
}

impl<R: Repository> AssignmentEngine<R> {
    /// Create an engine.
    #[must_use]
    pub fn new(repo: R, catalog: ChannelCatalog) -> Self {
        Self { repo, catalog }
    }

    /// Channel catalog.
    #[must_use]
    pub fn catalog(&self) -> &ChannelCatalog {
        &self.catalog
    }

    /// Underlying repository.
    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repo
    }

    // --- projects ---

    /// Create an empty project and return its id.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub fn create_project(&self, name: &str, description: &str) -> Result<String, AssignError> {
        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            let id = ws.insert_project(Project::new(name, description));
            tracing::info!(project_id = %id, name, "Created project");
            Ok(id)
        });
        logged("create_project", result)
    }

    /// All projects, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>, AssignError> {
        let ws = self.repo.load()?;
        let mut projects: Vec<ProjectSummary> = ws
            .projects
            .values()
            .map(|p| ProjectSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
                point_count: p.points.len(),
                scheme_count: p.schemes.len(),
                created_at: p.created_at,
                updated_at: p.updated_at,
            })
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }

    /// Replace a project's point catalog. Returns the number of points.
    ///
    /// Existing schemes are kept as they are; mappings to points that are no
    /// longer in the catalog show up as warnings in [`Self::validate_scheme`].
    ///
    /// # Errors
    ///
    /// Returns error if the project is unknown or a point id repeats.
    pub fn import_points(&self, project_id: &str, points: Vec<Point>) -> Result<usize, AssignError> {
        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            let mut seen = HashSet::new();
            if let Some(dup) = points.iter().find(|p| !seen.insert(p.id.as_str())) {
                return Err(AssignError::DuplicatePointId(dup.id.clone()));
            }

            let project = find_project_mut(ws, project_id)?;
            let count = points.len();
            project.points = points;
            project.touch();
            tracing::info!(project_id, points = count, "Imported point catalog");
            Ok(count)
        });
        logged("import_points", result)
    }

    /// Delete a project with all its schemes.
    ///
    /// # Errors
    ///
    /// Returns error if the project is unknown.
    pub fn delete_project(&self, project_id: &str) -> Result<(), AssignError> {
        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            ws.projects
                .remove(project_id)
                .ok_or_else(|| AssignError::ProjectNotFound(project_id.to_string()))?;
            tracing::info!(project_id, "Deleted project");
            Ok(())
        });
        logged("delete_project", result)
    }

    // --- schemes ---

    /// Create an empty scheme and return its id.
    ///
    /// # Errors
    ///
    /// Returns error if the project is unknown or the name is taken.
    pub fn create_scheme(
        &self,
        project_id: &str,
        name: &str,
        description: &str,
    ) -> Result<String, AssignError> {
        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            let project = find_project_mut(ws, project_id)?;
            if project.scheme_by_name(name).is_some() {
                return Err(AssignError::DuplicateSchemeName {
                    project_id: project_id.to_string(),
                    name: name.to_string(),
                });
            }

            let scheme = Scheme::new(project_id, name, description);
            let scheme_id = scheme.id.clone();
            project.schemes.push(scheme);
            project.touch();
            tracing::info!(project_id, %scheme_id, name, "Created scheme");
            Ok(scheme_id)
        });
        logged("create_scheme", result)
    }

    /// Schemes of a project in creation order.
    ///
    /// # Errors
    ///
    /// Returns error if the project is unknown.
    pub fn list_schemes(&self, project_id: &str) -> Result<Vec<SchemeSummary>, AssignError> {
        let ws = self.repo.load()?;
        let project = logged("list_schemes", find_project(&ws, project_id))?;
        Ok(project
            .schemes
            .iter()
            .map(|s| SchemeSummary {
                id: s.id.clone(),
                name: s.name.clone(),
                description: s.description.clone(),
                assignment_count: s.len(),
                created_at: s.created_at,
                updated_at: s.updated_at,
            })
            .collect())
    }

    /// Delete a scheme.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown.
    pub fn delete_scheme(&self, project_id: &str, scheme_id: &str) -> Result<(), AssignError> {
        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            let project = find_project_mut(ws, project_id)?;
            let before = project.schemes.len();
            project.schemes.retain(|s| s.id != scheme_id);
            if project.schemes.len() == before {
                return Err(scheme_not_found(project_id, scheme_id));
            }
            project.touch();
            tracing::info!(project_id, scheme_id, "Deleted scheme");
            Ok(())
        });
        logged("delete_scheme", result)
    }

    // --- assignment ---

    /// Check that `point` may take `channel_id` in `scheme`.
    fn check_assignment(
        &self,
        point: &Point,
        channel_id: &str,
        scheme: &Scheme,
    ) -> Result<ChannelInfo, AssignError> {
        let info = self
            .catalog
            .get_channel_info(channel_id)
            .map_err(|source| AssignError::invalid_channel(channel_id, source))?;

        if point.signal_type != info.channel_type {
            return Err(AssignError::TypeMismatch {
                instrument_tag: point.instrument_tag.clone(),
                point_type: point.signal_type.to_string(),
                channel_id: info.id.to_string(),
                channel_type: info.channel_type.to_string(),
            });
        }

        if let Some(holder) = scheme.channel_holder(&info.id) {
            if holder != point.id {
                return Err(AssignError::ChannelAlreadyAssigned {
                    channel_id: info.id.to_string(),
                    holder: holder.to_string(),
                });
            }
        }

        Ok(info)
    }

    /// Assign a point to a channel, replacing the point's prior mapping.
    ///
    /// Assigning a point to the channel it already holds changes nothing.
    ///
    /// # Errors
    ///
    /// Returns error if the project, scheme, or point is unknown, the channel
    /// is invalid or of another type, or another point holds the channel.
    pub fn assign(
        &self,
        project_id: &str,
        scheme_id: &str,
        point_id: &str,
        channel_id: &str,
    ) -> Result<Mapping, AssignError> {
        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            let (points, scheme) = split_scheme_mut(ws, project_id, scheme_id)?;
            let point = points
                .point(point_id)
                .ok_or_else(|| AssignError::PointNotFound {
                    project_id: project_id.to_string(),
                    point_id: point_id.to_string(),
                })?;

            let info = self.check_assignment(point, channel_id, scheme)?;

            if let Some(existing) = scheme.mapping_for(point_id) {
                if existing.channel_id == info.id {
                    tracing::debug!(point_id, channel_id = %info.id, "Point already on channel");
                    return Ok(existing.clone());
                }
            }

            let mapping = Mapping::new(point_id, info.id);
            scheme.upsert(mapping.clone());
            tracing::info!(
                scheme_id,
                point_id,
                instrument_tag = %point.instrument_tag,
                channel_id = %mapping.channel_id,
                "Assigned point"
            );
            Ok(mapping)
        });
        logged("assign", result)
    }

    /// Remove a point's mapping. Returns `false` if it had none.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown.
    pub fn unassign(
        &self,
        project_id: &str,
        scheme_id: &str,
        point_id: &str,
    ) -> Result<bool, AssignError> {
        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            let (_, scheme) = split_scheme_mut(ws, project_id, scheme_id)?;
            let removed = scheme.remove(point_id);
            if removed {
                tracing::info!(scheme_id, point_id, "Unassigned point");
            } else {
                tracing::debug!(scheme_id, point_id, "Point had no mapping");
            }
            Ok(removed)
        });
        logged("unassign", result)
    }

    /// Assign every unmapped point to free channels of its type.
    ///
    /// Candidates are grouped by signal type and sorted by instrument tag
    /// within each group. Groups run in canonical type order (`AI, DI, AO,
    /// DO, COMM`), then other types in first-seen order. Each group is placed
    /// positionally on its free channels in catalog order; if `start_channel`
    /// is of the group's type, channels below it are skipped. Points that do
    /// not fit are reported, not fatal. The batch is saved as one transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown or `start_channel`
    /// is invalid.
    pub fn auto_assign(
        &self,
        project_id: &str,
        scheme_id: &str,
        signal_type: Option<&SignalType>,
        start_channel: Option<&str>,
    ) -> Result<AutoAssignSummary, AssignError> {
        let start = start_channel
            .map(|raw| {
                self.catalog
                    .get_channel_info(raw)
                    .map(|info| info.id)
                    .map_err(|source| AssignError::invalid_channel(raw, source))
            })
            .transpose();
        let start = logged("auto_assign", start)?;

        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            let (points, scheme) = split_scheme_mut(ws, project_id, scheme_id)?;

            let already: HashSet<String> = scheme
                .assigned_point_ids()
                .into_iter()
                .map(str::to_string)
                .collect();

            let mut groups: Vec<(SignalType, Vec<&Point>)> = Vec::new();
            for point in points
                .iter()
                .filter(|p| signal_type.map_or(true, |t| &p.signal_type == t))
                .filter(|p| !already.contains(&p.id))
            {
                match groups.iter_mut().find(|(t, _)| t == &point.signal_type) {
                    Some((_, group)) => group.push(point),
                    None => groups.push((point.signal_type.clone(), vec![point])),
                }
            }
            // Stable: unknown types keep first-seen order
            groups.sort_by_key(|(t, _)| t.canonical_rank().unwrap_or(usize::MAX));

            let mut summary = AutoAssignSummary {
                total_points: groups.iter().map(|(_, g)| g.len()).sum(),
                ..AutoAssignSummary::default()
            };
            let mut used = scheme.used_channels();

            for (channel_type, mut group) in groups {
                group.sort_by(|a, b| a.instrument_tag.cmp(&b.instrument_tag));

                let available: Vec<ChannelId> = self
                    .catalog
                    .get_channels(&channel_type, &used)
                    .into_iter()
                    .filter(|c| c.is_available)
                    .filter(|c| {
                        start.as_ref().map_or(true, |s| {
                            s.channel_type() != &channel_type || c.index >= s.index()
                        })
                    })
                    .map(|c| c.id)
                    .collect();

                if group.len() > available.len() {
                    let message = format!(
                        "Not enough available {channel_type} channels: need {}, available {}",
                        group.len(),
                        available.len()
                    );
                    tracing::warn!(%channel_type, need = group.len(), available = available.len(), "Not enough available channels");
                    summary.errors.push(message);
                }

                for (i, point) in group.into_iter().enumerate() {
                    let Some(channel_id) = available.get(i) else {
                        let reason = format!(
                            "No more available {channel_type} channels for point {}",
                            point.instrument_tag
                        );
                        summary.errors.push(reason.clone());
                        summary.failures.push(AssignmentFailure {
                            point_id: point.id.clone(),
                            instrument_tag: point.instrument_tag.clone(),
                            signal_type: point.signal_type.clone(),
                            reason,
                        });
                        summary.failed += 1;
                        continue;
                    };

                    scheme.upsert(Mapping::new(&point.id, channel_id.clone()));
                    used.insert(channel_id.clone());
                    tracing::debug!(
                        instrument_tag = %point.instrument_tag,
                        channel_id = %channel_id,
                        "Auto-assigned point"
                    );
                    summary.assigned += 1;
                    summary.assignments.push(AssignmentRecord {
                        point_id: point.id.clone(),
                        point_tag: point.instrument_tag.clone(),
                        channel_id: channel_id.clone(),
                    });
                }
            }

            tracing::info!(
                scheme_id,
                assigned = summary.assigned,
                failed = summary.failed,
                "Auto assignment completed"
            );
            Ok(summary)
        });
        logged("auto_assign", result)
    }

    /// Remove every mapping of a scheme. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown.
    pub fn clear_assignments(&self, project_id: &str, scheme_id: &str) -> Result<usize, AssignError> {
        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            let (_, scheme) = split_scheme_mut(ws, project_id, scheme_id)?;
            let removed = scheme.clear();
            tracing::info!(scheme_id, removed, "Cleared assignments");
            Ok(removed)
        });
        logged("clear_assignments", result)
    }

    /// Replace all mappings of a scheme with `assignments` (point id to
    /// channel id).
    ///
    /// Every pair is checked as in [`Self::assign`], and no channel may be
    /// used twice. The first failure aborts and nothing is saved.
    ///
    /// # Errors
    ///
    /// Returns the first pair's error, or error if the project or scheme is
    /// unknown.
    pub fn replace_assignments(
        &self,
        project_id: &str,
        scheme_id: &str,
        assignments: &BTreeMap<String, String>,
    ) -> Result<usize, AssignError> {
        let result = self.repo.transaction(|ws| -> Result<_, AssignError> {
            let (points, scheme) = split_scheme_mut(ws, project_id, scheme_id)?;

            let mut staged = Scheme {
                mappings: Vec::with_capacity(assignments.len()),
                ..scheme.clone()
            };
            for (point_id, channel_id) in assignments {
                let point = points
                    .point(point_id)
                    .ok_or_else(|| AssignError::PointNotFound {
                        project_id: project_id.to_string(),
                        point_id: point_id.clone(),
                    })?;
                let info = self.check_assignment(point, channel_id, &staged)?;
                staged.mappings.push(Mapping::new(point_id, info.id));
            }

            scheme.mappings = staged.mappings;
            scheme.touch();
            tracing::info!(scheme_id, assignments = scheme.len(), "Replaced assignments");
            Ok(scheme.len())
        });
        logged("replace_assignments", result)
    }

    // --- queries ---

    /// Progress summary of a scheme, or `None` if the project or scheme does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the store fails.
    pub fn get_overview(
        &self,
        project_id: &str,
        scheme_id: &str,
    ) -> Result<Option<SchemeOverview>, AssignError> {
        let ws = self.repo.load()?;
        let Ok((project, scheme)) = find_scheme(&ws, project_id, scheme_id) else {
            tracing::warn!(project_id, scheme_id, "Overview requested for missing scheme");
            return Ok(None);
        };

        let assigned = live_assigned(&project.points, scheme);
        let assigned_ids: HashSet<&str> = assigned.iter().map(|p| p.id.as_str()).collect();

        let mut points_by_type: BTreeMap<SignalType, TypeBreakdown> = BTreeMap::new();
        for point in &project.points {
            let entry = points_by_type.entry(point.signal_type.clone()).or_default();
            entry.total += 1;
            if assigned_ids.contains(point.id.as_str()) {
                entry.assigned += 1;
            }
        }

        let total_points = project.points.len();
        Ok(Some(SchemeOverview {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            scheme_id: scheme.id.clone(),
            scheme_name: scheme.name.clone(),
            total_points,
            assigned_points: assigned.len(),
            unassigned_points: total_points - assigned.len(),
            coverage: coverage(assigned.len(), total_points),
            points_by_type,
            channel_statistics: self.catalog.statistics(&scheme.used_channels()),
            created_at: scheme.created_at,
            updated_at: scheme.updated_at,
        }))
    }

    /// Check a scheme for conflicts and drift.
    ///
    /// A channel used by more than one mapping is fatal (one error per
    /// channel). Mappings to points missing from the catalog, recorded types
    /// that differ from the point's current type, points mapped more than
    /// once, and channels outside the catalog are warnings.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown.
    pub fn validate_scheme(
        &self,
        project_id: &str,
        scheme_id: &str,
    ) -> Result<ValidationReport, AssignError> {
        let ws = self.repo.load()?;
        let (project, scheme) = logged("validate_scheme", find_scheme(&ws, project_id, scheme_id))?;

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut holders: BTreeMap<&ChannelId, Vec<&str>> = BTreeMap::new();
        let mut per_point: HashMap<&str, usize> = HashMap::new();
        for mapping in &scheme.mappings {
            holders
                .entry(&mapping.channel_id)
                .or_default()
                .push(mapping.point_id.as_str());
            *per_point.entry(mapping.point_id.as_str()).or_default() += 1;
        }

        for (channel_id, points) in &holders {
            if points.len() > 1 {
                errors.push(format!(
                    "Channel {channel_id} is assigned to multiple points: {}",
                    points.join(", ")
                ));
            }
            if self.catalog.resolve(channel_id).is_err() {
                warnings.push(format!("Channel {channel_id} is not in the channel catalog"));
            }
        }

        let mut reported = HashSet::new();
        for mapping in &scheme.mappings {
            let point_id = mapping.point_id.as_str();
            if per_point.get(point_id).copied().unwrap_or(0) > 1 && reported.insert(point_id) {
                warnings.push(format!("Point {point_id} is mapped to more than one channel"));
            }

            match project.point(point_id) {
                None => warnings.push(format!("Point {point_id} not found in parsed data")),
                Some(point) if point.signal_type != mapping.channel_type => {
                    warnings.push(format!(
                        "Point {} signal type ({}) doesn't match channel type ({})",
                        point.instrument_tag, point.signal_type, mapping.channel_type
                    ));
                }
                Some(_) => {}
            }
        }

        let total_points = project.points.len();
        let assigned = live_assigned(&project.points, scheme).len();
        let report = ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            total_assignments: scheme.len(),
            total_points,
            coverage: coverage(assigned, total_points),
        };
        tracing::info!(
            scheme_id,
            valid = report.valid,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validated scheme"
        );
        Ok(report)
    }

    /// Catalog points without a mapping, optionally of one type.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown.
    pub fn get_unassigned(
        &self,
        project_id: &str,
        scheme_id: &str,
        signal_type: Option<&SignalType>,
    ) -> Result<Vec<Point>, AssignError> {
        let ws = self.repo.load()?;
        let (project, scheme) = logged("get_unassigned", find_scheme(&ws, project_id, scheme_id))?;
        let assigned = scheme.assigned_point_ids();
        Ok(project
            .points
            .iter()
            .filter(|p| signal_type.map_or(true, |t| &p.signal_type == t))
            .filter(|p| !assigned.contains(p.id.as_str()))
            .cloned()
            .collect())
    }

    /// Free channels of a type in catalog order.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown.
    pub fn get_available_channels(
        &self,
        project_id: &str,
        scheme_id: &str,
        signal_type: &SignalType,
    ) -> Result<Vec<ChannelInfo>, AssignError> {
        let ws = self.repo.load()?;
        let (_, scheme) = logged(
            "get_available_channels",
            find_scheme(&ws, project_id, scheme_id),
        )?;
        Ok(self
            .catalog
            .get_channels(signal_type, &scheme.used_channels())
            .into_iter()
            .filter(|c| c.is_available)
            .collect())
    }

    /// Channels in use, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown.
    pub fn get_used_channels(
        &self,
        project_id: &str,
        scheme_id: &str,
    ) -> Result<Vec<ChannelId>, AssignError> {
        let ws = self.repo.load()?;
        let (_, scheme) = logged("get_used_channels", find_scheme(&ws, project_id, scheme_id))?;
        let mut used: Vec<ChannelId> = scheme.used_channels().into_iter().collect();
        used.sort();
        Ok(used)
    }

    /// Suggest channels for every unassigned point and report whether all
    /// of them fit.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown.
    pub fn suggest_optimal(
        &self,
        project_id: &str,
        scheme_id: &str,
    ) -> Result<OptimalSuggestion, AssignError> {
        let unassigned = self.get_unassigned(project_id, scheme_id, None)?;
        let mut used: HashSet<ChannelId> = self
            .get_used_channels(project_id, scheme_id)?
            .into_iter()
            .collect();

        let mut unassigned_by_type: BTreeMap<SignalType, usize> = BTreeMap::new();
        for point in &unassigned {
            *unassigned_by_type.entry(point.signal_type.clone()).or_default() += 1;
        }

        let requests: Vec<(SignalType, usize)> = unassigned_by_type
            .iter()
            .map(|(t, n)| (t.clone(), *n))
            .collect();
        let suggestions = self.catalog.suggest_channels(&requests, &mut used);

        let feasible = unassigned_by_type.keys().all(|t| {
            suggestions
                .iter()
                .any(|s| &s.channel_type == t && s.is_complete())
        });

        Ok(OptimalSuggestion {
            feasible,
            unassigned_by_type,
            suggestions,
        })
    }

    /// Assignment counts of a scheme.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown.
    pub fn statistics(
        &self,
        project_id: &str,
        scheme_id: &str,
    ) -> Result<AssignmentStatistics, AssignError> {
        let ws = self.repo.load()?;
        let (_, scheme) = logged("statistics", find_scheme(&ws, project_id, scheme_id))?;

        let mut by_channel_type: BTreeMap<SignalType, usize> = BTreeMap::new();
        for mapping in &scheme.mappings {
            *by_channel_type.entry(mapping.channel_type.clone()).or_default() += 1;
        }
        let mut used_channels: Vec<ChannelId> = scheme.used_channels().into_iter().collect();
        used_channels.sort();

        Ok(AssignmentStatistics {
            scheme_id: scheme.id.clone(),
            scheme_name: scheme.name.clone(),
            total_assignments: scheme.len(),
            by_channel_type,
            used_channels,
            created_at: scheme.created_at,
            updated_at: scheme.updated_at,
        })
    }

    // --- address planning ---

    /// Plan addresses for every mapping of a scheme.
    ///
    /// Mappings are planned in canonical channel-type order, then channel
    /// index, all from the planner's one allocator. Mappings whose point is
    /// gone or whose channel type has no value kind are skipped and listed.
    ///
    /// # Errors
    ///
    /// Returns error if the project or scheme is unknown or an address space
    /// is exhausted.
    pub fn plan_addresses(
        &self,
        project_id: &str,
        scheme_id: &str,
        mut planner: ModuleAddressPlanner,
    ) -> Result<AddressPlan, AssignError> {
        let ws = self.repo.load()?;
        let (project, scheme) = logged("plan_addresses", find_scheme(&ws, project_id, scheme_id))?;

        let mut mappings: Vec<&Mapping> = scheme.mappings.iter().collect();
        mappings.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));

        let mut planned = Vec::with_capacity(mappings.len());
        let mut skipped = Vec::new();
        for mapping in mappings {
            let Some(point) = project.point(&mapping.point_id) else {
                skipped.push(SkippedPoint {
                    point_id: mapping.point_id.clone(),
                    channel_id: mapping.channel_id.clone(),
                    reason: format!("Point {} not found in parsed data", mapping.point_id),
                });
                continue;
            };

            match planner.plan_point(point, &mapping.channel_id) {
                Ok(set) => planned.push(set),
                Err(err @ PlanError::NoValueKind { .. }) => {
                    tracing::debug!(point_id = %point.id, error = %err, "Skipping point");
                    skipped.push(SkippedPoint {
                        point_id: point.id.clone(),
                        channel_id: mapping.channel_id.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return logged("plan_addresses", Err(err.into())),
            }
        }

        tracing::info!(
            scheme_id,
            planned = planned.len(),
            skipped = skipped.len(),
            "Planned scheme addresses"
        );
        Ok(AddressPlan {
            project_id: project.id.clone(),
            scheme_id: scheme.id.clone(),
            points: planned,
            skipped,
            next_state: planner.allocator_state(),
        })
    }
}
