/*!

This is the long-form manual for `electoral_engine` and `elecproj`.

## Vote records

Every input is a list of vote records. A record counts the votes of one candidate
in one section of one zone:

| field             | type             | notes                                                |
|-------------------|------------------|------------------------------------------------------|
| `candidateNumber` | string or number | the ballot number, `050` and `50` are different      |
| `candidateName`   | string           |                                                      |
| `party`           | string           | party acronym                                        |
| `position`        | string           | optional if the data source sets one                 |
| `zone`            | string or number | electoral zone                                       |
| `section`         | string or number | section within the zone                              |
| `votes`           | integer          | must not be negative                                 |
| `city`            | string           |                                                      |
| `neighborhood`    | string           | optional, grouped as `city/neighborhood`, or under the city alone when missing |

The same candidate may not appear twice in the same zone and section, and a
candidate number keeps the same name, party and position across all its records.
Loading fails otherwise.

## Input formats

The following formats are supported:
* `json` a list of records, or an object with a `records` list
* `csv` Comma Separated Values with a header row
* `excel` the first worksheet (or a named one) of an Excel (.xlsx) workbook

### `json`

```text
[
  {"candidateNumber": "050", "candidateName": "Ana", "party": "PA", "position": "Councilor",
   "zone": 1, "section": "1", "votes": 300, "city": "Riverside", "neighborhood": "Centro"}
]
```

### `csv`

The header names the columns, in any order. The `position` and `neighborhood`
columns may be left out or left empty.

```text
candidateNumber,candidateName,party,position,zone,section,votes,city,neighborhood
050,Ana,PA,Councilor,1,1,300,Riverside,Centro
100,Bruno,PB,Councilor,2,4,100,Hillcrest,
```

### `excel`

The same layout as the CSV files. Numbers stored as numeric cells are read without decimals.

## Configuration

`elecproj` can run with a single `--input` file, but a configuration file in JSON
describes a whole election:

```text
{
  "outputSettings": {"electionName": "Lakeside municipal election", "electionDate": "2024-10-06"},
  "datasetSources": [{"provider": "csv", "filePath": "votes.csv"}],
  "parties": {"PA": "Party of the Avenues"},
  "settings": {"strongholdThresholdPct": 20.0, "goalRank": 5},
  "scenarios": [
    {"id": "riverside-push", "name": "Riverside push", "outlook": "optimistic",
     "adjustments": {"Riverside": 1.2}}
  ]
}
```

`datasetSources` (array): the files to read, relative to the configuration file.
 - `provider`: `json`, `csv` or `excel`
 - `filePath`
 - `excelWorksheetName` (optional): for Excel inputs, the name of the worksheet.
 - `position` (optional): the position of the records that do not state one.

`parties` (optional): the full names of the parties, by acronym. Parties without
a name are displayed with their acronym.

`settings` (optional), every entry has a default:
 - `strongholdThresholdPct` (20.0): a zone is a stronghold above this share of the votes of a candidate
 - `adjustmentStep` (0.05): the step of `--adjust`
 - `minMultiplier`, `maxMultiplier` (0.5, 1.5): the bounds of the city multipliers
 - `goalRank` (5): the rank whose votes are the goal of a projection
 - `nearRankMarginPct` (5.0): how close the next rank must be to trigger a recommendation
 - `highConcentrationPct` (50.0): the concentration above which a recommendation suggests expanding

`scenarios` (optional): the named scenarios. The `outlook` is `optimistic`, `neutral`
or `pessimistic`; a pessimistic scenario may not raise a city above 1.0. Cities
not listed keep a multiplier of 1.0. Without this entry, the presets `baseline`,
`optimistic`, `pessimistic` and `mobilization` are available for every city.

## Queries

| query             | arguments                               |
|-------------------|-----------------------------------------|
| `summary`         | `--position`                            |
| `parties`         | `--position`                            |
| `ranking`         | `--position`, `--limit`                 |
| `sections`        | `--position`, `--zone`                  |
| `geography`       | `--position`, `--dimension`             |
| `leaders`         | `--position`                            |
| `metrics`         | `--candidate`                           |
| `zones`           | `--candidate`                           |
| `competitors`     | `--candidate`, `--competitors`          |
| `recommendations` | `--candidate`                           |
| `compare`         | `--candidate`, `--versus`, `--dimension`|
| `scenarios`       |                                         |
| `project`         | `--candidate`, `--scenario`, `--adjust`, `--multiplier` |

The result of a query about an unknown candidate is `null`.

## Projections

A projection multiplies the votes of a candidate in each city and ranks the
projected total against the current votes of the other candidates of the same
position. The multipliers come from a scenario, and then from the adjustments:

```text
elecproj --config election.json --query project --candidate 210 \
    --scenario riverside-push --adjust Hillcrest=+ --multiplier Riverside=1.3
```

Any adjustment turns the projection into custom adjustments. Multipliers are kept
within the configured bounds.

With `--assistant-cmd`, the projection is also sent to an external program. The
program reads a JSON request on its standard input:

```text
{"context": {"candidateName": "Elisa", "projectedVotes": 325, ...},
 "history": [{"role": "user", "text": "--question"}]}
```

and its standard output is reported as the answer. A failing program does not fail the query.

 */
